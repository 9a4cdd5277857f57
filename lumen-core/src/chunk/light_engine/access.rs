//! Light access backed by a `VoxelWorld` and the engine's `LightHolder`.

use lumen_utils::{BlockPos, ChunkPos};

use super::{
    base::LightChunkAccess,
    chunk_cache::ChunkCache,
    pending::{PendingLight, PendingLightTable},
};
use crate::{
    block::{BlockProperties, LightChannel},
    chunk::{light_holder::LightHolder, sky_light_sources::ChunkSkyLightSources},
    error::LightError,
    world::{HeightmapProvider, VoxelWorld},
};

/// Reads blocks from the world and light from the holder for one pass.
///
/// Light for chunks the world has loaded is created on first write.
pub struct WorldLightAccess<'a, W: VoxelWorld + ?Sized> {
    world: &'a W,
    holder: &'a mut LightHolder,
    pending: &'a mut PendingLightTable,
    loaded: ChunkCache,
}

impl<'a, W: VoxelWorld + ?Sized> WorldLightAccess<'a, W> {
    /// Borrows everything a pass touches.
    pub fn new(world: &'a W, holder: &'a mut LightHolder, pending: &'a mut PendingLightTable) -> Self {
        Self {
            world,
            holder,
            pending,
            loaded: ChunkCache::new(),
        }
    }

    /// Removes the deferred light of `channel` aimed at `chunk`.
    pub fn take_pending(&mut self, chunk: ChunkPos, channel: LightChannel) -> Vec<PendingLight> {
        self.pending.take(chunk, channel)
    }
}

impl<W: VoxelWorld + ?Sized> LightChunkAccess for WorldLightAccess<'_, W> {
    fn min_y(&self) -> i32 {
        self.holder.min_y()
    }

    fn height(&self) -> i32 {
        self.holder.height()
    }

    fn is_chunk_loaded(&mut self, pos: ChunkPos) -> bool {
        let world = self.world;
        self.loaded.get_or_insert_with(pos, || world.has_chunk(pos))
    }

    #[inline]
    fn get_light(&mut self, channel: LightChannel, pos: BlockPos) -> u8 {
        self.holder.get(channel, pos).unwrap_or(0)
    }

    #[inline]
    fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8) {
        self.holder.set(channel, pos, level);
    }

    fn block(&mut self, pos: BlockPos) -> Result<BlockProperties, LightError> {
        Ok(self.world.block(pos)?.unwrap_or(BlockProperties::MISSING))
    }

    fn defer(&mut self, pending: PendingLight) {
        log::trace!(
            "Deferring {:?} light {} into unloaded chunk {}",
            pending.channel,
            pending.level,
            pending.target.chunk_pos()
        );
        self.pending.defer(pending);
    }

    fn sky_sources(&mut self, chunk: ChunkPos) -> &mut ChunkSkyLightSources {
        self.holder.get_or_create(chunk).sky_sources_mut()
    }

    fn heightmap(&self) -> Option<&dyn HeightmapProvider> {
        self.world.heightmap()
    }
}
