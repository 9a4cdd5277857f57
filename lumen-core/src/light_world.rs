//! The public light engine over a shared [`VoxelWorld`].

use std::{sync::Arc, time::Instant};

use lumen_utils::{BlockPos, ChunkPos};
use parking_lot::Mutex;

use crate::{
    block::{BlockProperties, LightChannel, LightChannels},
    chunk::{
        light_engine::{
            ColumnScheduler, ColumnTopSource, ColumnUpdate, LightChunkAccess, LightEngine,
            PendingLightTable, SkyLightEngine, UpdateResult, WorldLightAccess,
        },
        light_holder::{LightHolder, LightSnapshot},
    },
    config::LightConfig,
    error::LightError,
    stats::{self, LightStats},
    world::VoxelWorld,
};

/// A block change waiting for `run_light_updates`.
#[derive(Debug, Clone, Copy)]
struct StagedChange {
    pos: BlockPos,
    channels: LightChannels,
}

/// Everything guarded by the engine lock. Held for one job, never across an await.
struct EngineState {
    holder: LightHolder,
    pending: PendingLightTable,
    block_engine: LightEngine,
    sky_engine: LightEngine,
    sky: SkyLightEngine,
    staged: Vec<StagedChange>,
    stats: LightStats,
}

fn timed<T>(stats: &mut LightStats, operation: &'static str, run: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let result = run();
    stats.record(operation, started.elapsed());
    result
}

/// Keeps block and sky light of a voxel world up to date.
///
/// Light lives in the engine; blocks are read from the shared world. Column
/// recomputes go through a scheduler that runs one job at a time and lets newer
/// requests for the same column supersede queued ones.
pub struct LightWorld<W: VoxelWorld> {
    world: Arc<W>,
    config: LightConfig,
    state: Mutex<EngineState>,
    scheduler: ColumnScheduler,
}

impl<W: VoxelWorld> LightWorld<W> {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(world: Arc<W>) -> Self {
        Self::with_config(world, LightConfig::default())
    }

    /// Creates an engine. The column top source is fixed here: the world's
    /// heightmap when it offers one, a column scan otherwise.
    #[must_use]
    pub fn with_config(world: Arc<W>, config: LightConfig) -> Self {
        let top_source = if world.heightmap().is_some() {
            ColumnTopSource::Heightmap
        } else {
            ColumnTopSource::Scan
        };
        let state = EngineState {
            holder: LightHolder::new(world.world_min_y(), world.world_height()),
            pending: PendingLightTable::new(),
            block_engine: LightEngine::new(LightChannel::Block, config.queue_capacity),
            sky_engine: LightEngine::new(LightChannel::Sky, config.queue_capacity),
            sky: SkyLightEngine::new(config.directional_hints, top_source),
            staged: Vec::new(),
            stats: LightStats::default(),
        };
        log::debug!(
            "Light engine for y {}..{} using {top_source:?} column tops",
            world.world_min_y(),
            world.world_height()
        );
        Self {
            world,
            config,
            state: Mutex::new(state),
            scheduler: ColumnScheduler::new(),
        }
    }

    /// The world this engine lights.
    #[must_use]
    pub fn world(&self) -> &Arc<W> {
        &self.world
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    fn contains_y(&self, y: i32) -> bool {
        (self.world.world_min_y()..self.world.world_height()).contains(&y)
    }

    /// Stored block light. `None` outside the world or for chunks without light.
    #[must_use]
    pub fn block_light(&self, pos: BlockPos) -> Option<u8> {
        self.state.lock().holder.get(LightChannel::Block, pos)
    }

    /// Stored sky light. `None` outside the world or for chunks without light.
    #[must_use]
    pub fn sky_light(&self, pos: BlockPos) -> Option<u8> {
        self.state.lock().holder.get(LightChannel::Sky, pos)
    }

    /// Replaces a block and relights around it before returning.
    ///
    /// Also applies any changes staged with [`LightWorld::set_block_deferred`].
    /// Returns the chunks whose light changed.
    pub fn set_block(&self, pos: BlockPos, block: BlockProperties) -> Result<Vec<ChunkPos>, LightError> {
        self.set_block_deferred(pos, block)?;
        self.run_light_updates()
    }

    /// Replaces a block and stages the light change for [`LightWorld::run_light_updates`].
    ///
    /// Positions outside the world are ignored.
    pub fn set_block_deferred(&self, pos: BlockPos, block: BlockProperties) -> Result<(), LightError> {
        if !self.contains_y(pos.y()) {
            log::debug!("Ignoring block change at {pos} outside of the world");
            return Ok(());
        }
        let old = self.world.block(pos)?.unwrap_or(BlockProperties::MISSING);
        self.world.set_block(pos, &block)?;

        let channels = LightChannels::for_change(&old, &block);
        if !channels.is_empty() {
            self.state.lock().staged.push(StagedChange { pos, channels });
        }
        Ok(())
    }

    /// Applies every staged block change: old light is retracted and the
    /// region relit, block light first, then sky light.
    ///
    /// Returns the chunks whose light changed.
    pub fn run_light_updates(&self) -> Result<Vec<ChunkPos>, LightError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let staged = std::mem::take(&mut state.staged);
        if staged.is_empty() {
            return Ok(Vec::new());
        }

        let since = state.holder.advance_clock();
        let started = Instant::now();
        let result = Self::apply_staged(&*self.world, state, &staged);
        state.stats.record(stats::BLOCK_UPDATE, started.elapsed());
        Self::absorb_visits(state);
        result?;

        let affected = state.holder.modified_since(since);
        if self.config.write_back_light {
            self.write_back(&state.holder, &affected);
        }
        Ok(affected)
    }

    fn apply_staged(world: &W, state: &mut EngineState, staged: &[StagedChange]) -> Result<(), LightError> {
        let EngineState {
            holder,
            pending,
            block_engine,
            sky_engine,
            sky,
            stats: counters,
            ..
        } = state;
        let mut access = WorldLightAccess::new(world, holder, pending);

        let block_changes: Vec<BlockPos> = staged
            .iter()
            .filter(|change| change.channels.includes(LightChannel::Block))
            .map(|change| change.pos)
            .collect();
        if !block_changes.is_empty() {
            for &pos in &block_changes {
                block_engine.retract(&mut access, pos);
            }
            timed(counters, stats::DECREASE, || block_engine.propagate_decreases(&mut access))?;
            for &pos in &block_changes {
                let block = access.block(pos)?;
                if block.emission() > 0 {
                    block_engine.seed(&mut access, pos, block.emission());
                }
                if !block.is_opaque {
                    block_engine.reflood_around(&mut access, pos);
                }
            }
            timed(counters, stats::INCREASE, || block_engine.propagate_increases(&mut access))?;
        }

        if !world.supports_sky_light() {
            return Ok(());
        }
        let sky_changes: Vec<BlockPos> = staged
            .iter()
            .filter(|change| change.channels.includes(LightChannel::Sky))
            .map(|change| change.pos)
            .collect();
        if !sky_changes.is_empty() {
            for &pos in &sky_changes {
                sky.retract_column(&mut access, sky_engine, pos)?;
            }
            timed(counters, stats::DECREASE, || sky_engine.propagate_decreases(&mut access))?;
            for &pos in &sky_changes {
                sky.refill_column(&mut access, sky_engine, pos)?;
            }
            timed(counters, stats::INCREASE, || sky_engine.propagate_increases(&mut access))?;
        }
        Ok(())
    }

    /// Relights a whole column and waits for the result.
    pub async fn request_column_update(&self, pos: ChunkPos) -> UpdateResult {
        self.request_column_update_with(pos, LightChannels::BOTH).await
    }

    /// Relights the given channels of a column and waits for the result.
    ///
    /// A newer request for the same column made before this one starts running
    /// resolves this one as [`ColumnUpdate::Cancelled`].
    pub async fn request_column_update_with(&self, pos: ChunkPos, channels: LightChannels) -> UpdateResult {
        if !self.world.has_chunk(pos) {
            return Err(LightError::ChunkNotLoaded(pos));
        }
        let receiver = self.scheduler.submit(pos, channels);
        // Give a newer request for the same column the chance to supersede this one.
        tokio::task::yield_now().await;

        {
            let _drain = self.scheduler.lock_drain().await;
            while let Some(job) = self.scheduler.next_job() {
                let result = self.run_column_job(job.pos, job.channels);
                self.scheduler.finish(job.pos, job.generation);
                job.complete(result);
                if self.config.yield_between_jobs {
                    tokio::task::yield_now().await;
                }
            }
        }

        // A dropped sender means the request was discarded without a result.
        receiver.await.unwrap_or(Ok(ColumnUpdate::Cancelled))
    }

    /// Writes a block into the world and relights its column through the scheduler.
    pub async fn set_block_and_update(&self, pos: BlockPos, block: BlockProperties) -> UpdateResult {
        if !self.contains_y(pos.y()) {
            return Ok(ColumnUpdate::Completed(Vec::new()));
        }
        let old = self.world.block(pos)?.unwrap_or(BlockProperties::MISSING);
        self.world.set_block(pos, &block)?;
        let channels = LightChannels::for_change(&old, &block);
        if channels.is_empty() {
            return Ok(ColumnUpdate::Completed(Vec::new()));
        }
        self.request_column_update_with(pos.chunk_pos(), channels).await
    }

    fn run_column_job(&self, pos: ChunkPos, channels: LightChannels) -> UpdateResult {
        if !self.world.has_chunk(pos) {
            return Err(LightError::ChunkNotLoaded(pos));
        }
        let span = tracing::debug_span!("column_update", x = pos.x(), z = pos.z());
        let _entered = span.enter();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let since = state.holder.advance_clock();
        let started = Instant::now();
        let result = Self::recompute_column(&*self.world, state, pos, channels);
        state.stats.record(stats::COLUMN_UPDATE, started.elapsed());
        Self::absorb_visits(state);
        if let Err(err) = result {
            log::warn!("Relighting column {pos} failed: {err}");
            return Err(err);
        }

        let affected = state.holder.modified_since(since);
        if self.config.write_back_light {
            self.write_back(&state.holder, &affected);
        }
        log::debug!("Relit column {pos}, {} chunks affected", affected.len());
        Ok(ColumnUpdate::Completed(affected))
    }

    fn recompute_column(
        world: &W,
        state: &mut EngineState,
        pos: ChunkPos,
        channels: LightChannels,
    ) -> Result<(), LightError> {
        let EngineState {
            holder,
            pending,
            block_engine,
            sky_engine,
            sky,
            stats: counters,
            ..
        } = state;
        let (min_y, height) = (holder.min_y(), holder.height());
        let with_block = channels.includes(LightChannel::Block);
        let with_sky = channels.includes(LightChannel::Sky) && world.supports_sky_light();

        let chunk = holder.get_or_create(pos);
        let block_lit = if with_block {
            chunk.lit_voxels(LightChannel::Block)
        } else {
            Vec::new()
        };
        let sky_lit = if with_sky {
            chunk.lit_voxels(LightChannel::Sky)
        } else {
            Vec::new()
        };

        let mut access = WorldLightAccess::new(world, holder, pending);

        if with_block {
            for &(x, y, z, _) in &block_lit {
                block_engine.retract(&mut access, pos.block_at(x, y, z));
            }
            timed(counters, stats::DECREASE, || block_engine.propagate_decreases(&mut access))?;
            for y in min_y..height {
                for z in 0..16 {
                    for x in 0..16 {
                        let voxel = pos.block_at(x, y, z);
                        let emission = access.block(voxel)?.emission();
                        if emission > 0 {
                            block_engine.seed(&mut access, voxel, emission);
                        }
                    }
                }
            }
            let deferred = access.take_pending(pos, LightChannel::Block);
            block_engine.replay_pending(&mut access, deferred)?;
            timed(counters, stats::INCREASE, || block_engine.propagate_increases(&mut access))?;
        }

        if with_sky {
            for &(x, y, z, _) in &sky_lit {
                sky_engine.retract(&mut access, pos.block_at(x, y, z));
            }
            timed(counters, stats::DECREASE, || sky_engine.propagate_decreases(&mut access))?;
            timed(counters, stats::SKY_INIT, || sky.initialize_chunk(&mut access, sky_engine, pos))?;
            let deferred = access.take_pending(pos, LightChannel::Sky);
            sky_engine.replay_pending(&mut access, deferred)?;
            timed(counters, stats::INCREASE, || sky_engine.propagate_increases(&mut access))?;
        }
        Ok(())
    }

    fn absorb_visits(state: &mut EngineState) {
        state.stats.voxels_visited +=
            state.block_engine.take_visited() + state.sky_engine.take_visited();
    }

    fn write_back(&self, holder: &LightHolder, affected: &[ChunkPos]) {
        for &pos in affected {
            let Some(chunk) = holder.chunk(pos) else {
                continue;
            };
            for y in holder.min_y()..holder.height() {
                for z in 0..16 {
                    for x in 0..16 {
                        let voxel = pos.block_at(x, y, z);
                        self.world
                            .set_block_light(voxel, chunk.get(LightChannel::Block, x, y, z));
                        self.world
                            .set_sky_light(voxel, chunk.get(LightChannel::Sky, x, y, z));
                    }
                }
            }
        }
    }

    /// Forgets a column's queued update, deferred light in both directions and
    /// staged changes.
    ///
    /// Stored light is kept, so the next recompute of the column retracts what
    /// it spread into its neighbours before relighting.
    pub fn unload_column(&self, pos: ChunkPos) {
        let cancelled = self.scheduler.forget(pos);
        let mut state = self.state.lock();
        let dropped = state.pending.drop_chunk(pos);
        state.staged.retain(|change| change.pos.chunk_pos() != pos);
        log::debug!(
            "Unloaded light column {pos} (pending request: {cancelled}, deferred entries dropped: {dropped})"
        );
    }

    /// Renders one horizontal slice of light levels, one row per z from `z_start`
    /// to `z_end` and one cell per x from `x_start` to `x_end`, both inclusive.
    ///
    /// Voxels without stored light show as `--`.
    #[must_use]
    pub fn light_levels_string(
        &self,
        x_start: i32,
        z_start: i32,
        y: i32,
        x_end: i32,
        z_end: i32,
        channel: LightChannel,
    ) -> String {
        let state = self.state.lock();
        let mut rows = Vec::new();
        for z in z_start..=z_end {
            let cells: String = (x_start..=x_end)
                .map(|x| match state.holder.get(channel, BlockPos::new(x, y, z)) {
                    Some(level) => format!(" {level:>2} |"),
                    None => String::from(" -- |"),
                })
                .collect();
            rows.push(format!("|{cells}"));
        }
        rows.join("\n")
    }

    /// Copies a column's stored light.
    #[must_use]
    pub fn dump_chunk(&self, pos: ChunkPos) -> Option<LightSnapshot> {
        self.state.lock().holder.dump_chunk(pos)
    }

    /// Restores a column's light from a snapshot instead of recomputing it.
    pub fn load_chunk(&self, snapshot: &LightSnapshot) -> Result<(), LightError> {
        self.state.lock().holder.load_chunk(snapshot)
    }

    /// Number of deferred cross-chunk entries aimed at `pos`.
    #[must_use]
    pub fn pending_light_for(&self, pos: ChunkPos) -> usize {
        self.state.lock().pending.pending_for(pos)
    }

    /// A copy of the performance counters.
    #[must_use]
    pub fn stats(&self) -> LightStats {
        let mut stats = self.state.lock().stats.clone();
        stats.cancelled_jobs = self.scheduler.cancelled();
        stats
    }
}
