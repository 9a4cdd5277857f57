//! In-memory voxel world.
//!
//! Chunks live entirely in RAM and start out as air. Useful for:
//! - Tests and benchmarks
//! - Tools that light a handful of chunks without a game server

use anyhow::bail;
use lumen_utils::{BlockPos, ChunkPos};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{HeightmapProvider, VoxelWorld};
use crate::block::BlockProperties;

/// A small palette of blocks covering every light behaviour.
pub mod blocks {
    use crate::block::BlockProperties;

    /// Empty space.
    pub const AIR: BlockProperties = BlockProperties::AIR;
    /// A plain opaque block.
    pub const STONE: BlockProperties = BlockProperties::opaque(1);
    /// An opaque block emitting full light.
    pub const GLOWSTONE: BlockProperties = BlockProperties::opaque(2).emitting(15);
    /// Light passes, attenuated by water's filter of 2.
    pub const WATER: BlockProperties = BlockProperties::transparent(8).filtering(2);
    /// Fully transparent.
    pub const GLASS: BlockProperties = BlockProperties::transparent(20);
}

#[inline]
fn voxel_index(pos: BlockPos, min_y: i32) -> usize {
    pos.local_x() + pos.local_z() * 16 + (pos.y() - min_y) as usize * 256
}

struct MemoryChunk {
    palette: Vec<BlockProperties>,
    blocks: Box<[u16]>,
    block_light: Box<[u8]>,
    sky_light: Box<[u8]>,
}

impl MemoryChunk {
    fn new(volume: usize) -> Self {
        Self {
            palette: vec![BlockProperties::AIR],
            blocks: vec![0; volume].into_boxed_slice(),
            block_light: vec![0; volume].into_boxed_slice(),
            sky_light: vec![0; volume].into_boxed_slice(),
        }
    }

    fn palette_id(&mut self, block: &BlockProperties) -> u16 {
        if let Some(id) = self.palette.iter().position(|entry| entry == block) {
            return id as u16;
        }
        self.palette.push(*block);
        (self.palette.len() - 1) as u16
    }
}

/// A [`VoxelWorld`] stored in memory.
///
/// Writing a block into a missing chunk loads it first, so tests can build
/// scenes with plain `set_block` calls.
pub struct MemoryWorld {
    min_y: i32,
    height: i32,
    sky_light: bool,
    heightmap: bool,
    chunks: RwLock<FxHashMap<ChunkPos, MemoryChunk>>,
}

impl MemoryWorld {
    /// An empty world covering `min_y..height` with sky light.
    #[must_use]
    pub fn new(min_y: i32, height: i32) -> Self {
        Self {
            min_y,
            height,
            sky_light: true,
            heightmap: false,
            chunks: RwLock::new(FxHashMap::default()),
        }
    }

    /// Turns sky light on or off.
    #[must_use]
    pub fn with_sky_light(mut self, sky_light: bool) -> Self {
        self.sky_light = sky_light;
        self
    }

    /// Exposes the world's own column scan as a [`HeightmapProvider`].
    #[must_use]
    pub fn with_heightmap(mut self, heightmap: bool) -> Self {
        self.heightmap = heightmap;
        self
    }

    fn volume(&self) -> usize {
        256 * (self.height - self.min_y).max(0) as usize
    }

    /// Loads an all-air chunk. Already loaded chunks are left untouched.
    pub fn load_chunk(&self, pos: ChunkPos) {
        let volume = self.volume();
        self.chunks
            .write()
            .entry(pos)
            .or_insert_with(|| MemoryChunk::new(volume));
    }

    /// Drops a chunk and everything in it.
    pub fn unload_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.write().remove(&pos).is_some()
    }

    /// Positions of all loaded chunks.
    #[must_use]
    pub fn loaded_chunks(&self) -> Vec<ChunkPos> {
        self.chunks.read().keys().copied().collect()
    }

    /// Fills the inclusive box between `from` and `to` with `block`.
    pub fn fill(&self, from: BlockPos, to: BlockPos, block: &BlockProperties) -> anyhow::Result<()> {
        for y in from.y().min(to.y())..=from.y().max(to.y()) {
            for z in from.z().min(to.z())..=from.z().max(to.z()) {
                for x in from.x().min(to.x())..=from.x().max(to.x()) {
                    self.set_block(BlockPos::new(x, y, z), block)?;
                }
            }
        }
        Ok(())
    }

    fn in_range(&self, pos: BlockPos) -> bool {
        (self.min_y..self.height).contains(&pos.y())
    }

    fn stored_light(&self, pos: BlockPos, sky: bool) -> Option<u8> {
        if !self.in_range(pos) {
            return None;
        }
        let chunks = self.chunks.read();
        let chunk = chunks.get(&pos.chunk_pos())?;
        let index = voxel_index(pos, self.min_y);
        Some(if sky {
            chunk.sky_light[index]
        } else {
            chunk.block_light[index]
        })
    }

    fn store_light(&self, pos: BlockPos, level: u8, sky: bool) {
        if !self.in_range(pos) {
            return;
        }
        let mut chunks = self.chunks.write();
        if let Some(chunk) = chunks.get_mut(&pos.chunk_pos()) {
            let index = voxel_index(pos, self.min_y);
            if sky {
                chunk.sky_light[index] = level;
            } else {
                chunk.block_light[index] = level;
            }
        }
    }
}

impl VoxelWorld for MemoryWorld {
    fn world_height(&self) -> i32 {
        self.height
    }

    fn world_min_y(&self) -> i32 {
        self.min_y
    }

    fn supports_sky_light(&self) -> bool {
        self.sky_light
    }

    fn has_chunk(&self, pos: ChunkPos) -> bool {
        self.chunks.read().contains_key(&pos)
    }

    fn block(&self, pos: BlockPos) -> anyhow::Result<Option<BlockProperties>> {
        if !self.in_range(pos) {
            return Ok(None);
        }
        let chunks = self.chunks.read();
        Ok(chunks.get(&pos.chunk_pos()).map(|chunk| {
            let id = chunk.blocks[voxel_index(pos, self.min_y)];
            chunk.palette[usize::from(id)]
        }))
    }

    fn set_block(&self, pos: BlockPos, block: &BlockProperties) -> anyhow::Result<()> {
        if !self.in_range(pos) {
            bail!("y {} is outside of {}..{}", pos.y(), self.min_y, self.height);
        }
        let volume = self.volume();
        let mut chunks = self.chunks.write();
        let chunk = chunks
            .entry(pos.chunk_pos())
            .or_insert_with(|| MemoryChunk::new(volume));
        let id = chunk.palette_id(block);
        chunk.blocks[voxel_index(pos, self.min_y)] = id;
        Ok(())
    }

    fn block_light(&self, pos: BlockPos) -> Option<u8> {
        self.stored_light(pos, false)
    }

    fn sky_light(&self, pos: BlockPos) -> Option<u8> {
        self.stored_light(pos, true)
    }

    fn set_block_light(&self, pos: BlockPos, level: u8) {
        self.store_light(pos, level, false);
    }

    fn set_sky_light(&self, pos: BlockPos, level: u8) {
        self.store_light(pos, level, true);
    }

    fn heightmap(&self) -> Option<&dyn HeightmapProvider> {
        if self.heightmap { Some(self) } else { None }
    }
}

impl HeightmapProvider for MemoryWorld {
    fn sky_top(&self, x: i32, z: i32) -> anyhow::Result<Option<i32>> {
        let column = BlockPos::new(x, self.min_y, z);
        let chunks = self.chunks.read();
        let Some(chunk) = chunks.get(&column.chunk_pos()) else {
            return Ok(None);
        };
        let base = column.local_x() + column.local_z() * 16;
        for y in (self.min_y..self.height).rev() {
            let id = chunk.blocks[base + (y - self.min_y) as usize * 256];
            if chunk.palette[usize::from(id)].is_opaque {
                return Ok(Some(y));
            }
        }
        Ok(None)
    }
}
