//! Base light engine for flood-fill light propagation.

use std::collections::hash_map::Entry;

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;

use super::{
    direction::Direction,
    light_queue::LightQueue,
    pending::PendingLight,
    queue_entry::{DirectionSet, QueueEntry},
};
use crate::{
    block::{BlockProperties, LightChannel},
    chunk::sky_light_sources::ChunkSkyLightSources,
    error::LightError,
    world::HeightmapProvider,
};

/// Everything a propagation pass needs from the world and the light store.
pub trait LightChunkAccess {
    /// Lowest valid y.
    fn min_y(&self) -> i32;

    /// Exclusive top y.
    fn height(&self) -> i32;

    /// Whether `y` lies inside the world.
    fn contains_y(&self, y: i32) -> bool {
        (self.min_y()..self.height()).contains(&y)
    }

    /// Whether the world has the chunk loaded.
    fn is_chunk_loaded(&mut self, pos: ChunkPos) -> bool;

    /// Stored light, `0` for voxels never written.
    fn get_light(&mut self, channel: LightChannel, pos: BlockPos) -> u8;

    /// Stores light.
    fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8);

    /// The block at `pos`, with missing data reported as [`BlockProperties::MISSING`].
    fn block(&mut self, pos: BlockPos) -> Result<BlockProperties, LightError>;

    /// Records light that could not enter an unloaded chunk.
    fn defer(&mut self, pending: PendingLight);

    /// Cached sky tops of a loaded chunk.
    fn sky_sources(&mut self, chunk: ChunkPos) -> &mut ChunkSkyLightSources;

    /// The world's heightmap, if it offers one.
    fn heightmap(&self) -> Option<&dyn HeightmapProvider> {
        None
    }
}

/// Flood-fill engine for one light channel.
///
/// Keeps two FIFO queues:
/// - `decrease_queue`: voxels whose old light must be cleared from their surroundings
/// - `increase_queue`: voxels whose light must be spread to their surroundings
///
/// [`LightEngine::run_light_updates`] always drains decreases before increases,
/// so light is only ever rebuilt on top of fully retracted regions.
#[derive(Debug)]
pub struct LightEngine {
    channel: LightChannel,
    increase_queue: LightQueue,
    decrease_queue: LightQueue,
    /// Level and directions each voxel was already expanded with in the current pass.
    processed: FxHashMap<BlockPos, (u8, DirectionSet)>,
    visited: u64,
}

impl LightEngine {
    /// Creates an engine whose queues start with room for `capacity` entries.
    #[must_use]
    pub fn new(channel: LightChannel, capacity: usize) -> Self {
        Self {
            channel,
            increase_queue: LightQueue::with_capacity(capacity),
            decrease_queue: LightQueue::with_capacity(capacity),
            processed: FxHashMap::default(),
            visited: 0,
        }
    }

    /// The channel this engine writes.
    #[must_use]
    pub fn channel(&self) -> LightChannel {
        self.channel
    }

    /// Enqueues a light increase at the given position.
    pub fn enqueue_increase(&mut self, pos: BlockPos, entry: QueueEntry) {
        self.increase_queue.enqueue(pos, entry);
    }

    /// Enqueues a light decrease at the given position.
    pub fn enqueue_decrease(&mut self, pos: BlockPos, entry: QueueEntry) {
        self.decrease_queue.enqueue(pos, entry);
    }

    /// Raises `pos` to `level` if it is darker and queues it for spreading.
    ///
    /// Returns whether the stored value changed.
    pub fn seed(&mut self, access: &mut impl LightChunkAccess, pos: BlockPos, level: u8) -> bool {
        if access.get_light(self.channel, pos) >= level {
            return false;
        }
        access.set_light(self.channel, pos, level);
        self.enqueue_increase(pos, QueueEntry::increase_all_directions(level));
        true
    }

    /// Clears `pos` and queues its old light for retraction.
    pub fn retract(&mut self, access: &mut impl LightChunkAccess, pos: BlockPos) {
        let old = access.get_light(self.channel, pos);
        if old > 0 {
            access.set_light(self.channel, pos, 0);
            self.enqueue_decrease(pos, QueueEntry::decrease_all_directions(old));
        }
    }

    /// Queues every lit neighbour of `pos` so light flows back into it.
    pub fn reflood_around(&mut self, access: &mut impl LightChunkAccess, pos: BlockPos) {
        for dir in Direction::ALL {
            let neighbor = dir.relative(pos);
            if !access.contains_y(neighbor.y()) || !access.is_chunk_loaded(neighbor.chunk_pos()) {
                continue;
            }
            let level = access.get_light(self.channel, neighbor);
            if level > 0 {
                self.enqueue_increase(neighbor, QueueEntry::increase_all_directions(level));
            }
        }
    }

    /// Re-runs deferred light as if it had just crossed into its target.
    ///
    /// The emitting voxel may have darkened since the entry was recorded, so
    /// its current light is used whenever its chunk is still loaded.
    pub fn replay_pending(
        &mut self,
        access: &mut impl LightChunkAccess,
        entries: Vec<PendingLight>,
    ) -> Result<(), LightError> {
        for pending in entries {
            let target = pending.target;
            if !access.contains_y(target.y()) || !access.is_chunk_loaded(target.chunk_pos()) {
                continue;
            }
            let source = pending.direction.opposite().relative(target);
            let level = if access.is_chunk_loaded(source.chunk_pos()) {
                access.get_light(self.channel, source)
            } else {
                pending.level
            };
            let block = access.block(target)?;
            if block.is_opaque {
                continue;
            }
            let candidate = block.attenuate(level);
            if access.get_light(self.channel, target) < candidate {
                access.set_light(self.channel, target, candidate);
                self.enqueue_increase(
                    target,
                    QueueEntry::increase_skip_one_direction(candidate, pending.direction.opposite()),
                );
            }
        }
        Ok(())
    }

    /// Runs all queued light updates: decreases first, then increases.
    pub fn run_light_updates(&mut self, access: &mut impl LightChunkAccess) -> Result<(), LightError> {
        self.propagate_decreases(access)?;
        self.propagate_increases(access)
    }

    /// Drains the decrease queue.
    ///
    /// A neighbour darker than the cleared light was lit by it and is cleared in
    /// turn; emitters among them are reseeded. A neighbour at least as bright has
    /// another source and is queued to flood back in.
    pub fn propagate_decreases(&mut self, access: &mut impl LightChunkAccess) -> Result<(), LightError> {
        let result = self.drain_decreases(access);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn drain_decreases(&mut self, access: &mut impl LightChunkAccess) -> Result<(), LightError> {
        while let Some((pos, entry)) = self.decrease_queue.dequeue() {
            self.visited += 1;
            let old = entry.level();
            for dir in Direction::ALL {
                if !entry.should_propagate(dir) {
                    continue;
                }
                let neighbor = dir.relative(pos);
                if !access.contains_y(neighbor.y()) || !access.is_chunk_loaded(neighbor.chunk_pos()) {
                    continue;
                }
                let level = access.get_light(self.channel, neighbor);
                if level == 0 {
                    continue;
                }
                if level < old {
                    access.set_light(self.channel, neighbor, 0);
                    self.decrease_queue.enqueue(
                        neighbor,
                        QueueEntry::decrease_skip_one_direction(level, dir.opposite()),
                    );
                    if self.channel == LightChannel::Block {
                        let emission = access.block(neighbor)?.emission();
                        if emission > 0 {
                            access.set_light(self.channel, neighbor, emission);
                            self.increase_queue
                                .enqueue(neighbor, QueueEntry::increase_all_directions(emission));
                        }
                    }
                } else {
                    self.increase_queue
                        .enqueue(neighbor, QueueEntry::increase_all_directions(level));
                }
            }
        }
        Ok(())
    }

    /// Drains the increase queue.
    ///
    /// Each voxel hands `filter(neighbor, level)` to darker, non-opaque
    /// neighbours in its hinted directions. Steps into unloaded chunks are deferred.
    pub fn propagate_increases(&mut self, access: &mut impl LightChunkAccess) -> Result<(), LightError> {
        let result = self.drain_increases(access);
        self.processed.clear();
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn drain_increases(&mut self, access: &mut impl LightChunkAccess) -> Result<(), LightError> {
        while let Some((pos, entry)) = self.increase_queue.dequeue() {
            self.visited += 1;
            let level = access.get_light(self.channel, pos);
            if level <= 1 {
                continue;
            }

            let mut directions = entry.directions();
            match self.processed.entry(pos) {
                Entry::Occupied(mut slot) => {
                    let (done_level, done) = slot.get_mut();
                    if *done_level > level {
                        continue;
                    }
                    if *done_level == level {
                        directions = directions.difference(*done);
                        if directions.is_empty() {
                            continue;
                        }
                        *done |= directions;
                    } else {
                        *slot.get_mut() = (level, directions);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert((level, directions));
                }
            }

            let block = access.block(pos)?;
            if block.is_opaque && !block.is_light_source {
                continue;
            }

            for dir in Direction::ALL {
                if !directions.has(dir) {
                    continue;
                }
                let neighbor = dir.relative(pos);
                if !access.contains_y(neighbor.y()) {
                    continue;
                }
                let neighbor_chunk = neighbor.chunk_pos();
                if !access.is_chunk_loaded(neighbor_chunk) {
                    access.defer(PendingLight {
                        target: neighbor,
                        direction: dir,
                        level,
                        channel: self.channel,
                        source: pos.chunk_pos(),
                    });
                    continue;
                }
                let neighbor_block = access.block(neighbor)?;
                if neighbor_block.is_opaque {
                    continue;
                }
                let candidate = neighbor_block.attenuate(level);
                if access.get_light(self.channel, neighbor) < candidate {
                    access.set_light(self.channel, neighbor, candidate);
                    self.increase_queue.enqueue(
                        neighbor,
                        QueueEntry::increase_skip_one_direction(candidate, dir.opposite()),
                    );
                }
            }
        }
        Ok(())
    }

    /// Checks if there are any pending light updates.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.increase_queue.is_empty() || !self.decrease_queue.is_empty()
    }

    /// Returns the number of queued increase operations.
    #[must_use]
    pub fn increase_queue_size(&self) -> usize {
        self.increase_queue.len()
    }

    /// Returns the number of queued decrease operations.
    #[must_use]
    pub fn decrease_queue_size(&self) -> usize {
        self.decrease_queue.len()
    }

    /// Drops all queued work.
    pub fn clear(&mut self) {
        self.increase_queue.clear();
        self.decrease_queue.clear();
        self.processed.clear();
    }

    /// Voxels popped since the last call.
    pub fn take_visited(&mut self) -> u64 {
        std::mem::take(&mut self.visited)
    }
}
