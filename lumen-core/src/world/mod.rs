//! The voxel world the light engine reads blocks from.
//!
//! The engine never owns block data. Everything it knows about blocks comes from
//! a caller-supplied [`VoxelWorld`].

mod memory;

use lumen_utils::{BlockPos, ChunkPos};

use crate::block::BlockProperties;

pub use memory::{MemoryWorld, blocks};

/// Block storage the light engine runs against.
///
/// Implementations use interior mutability; the engine shares the world with
/// the caller through an `Arc`.
pub trait VoxelWorld: Send + Sync {
    /// Exclusive upper y bound.
    fn world_height(&self) -> i32;

    /// Lowest valid y.
    fn world_min_y(&self) -> i32;

    /// Whether sky light should be computed at all.
    fn supports_sky_light(&self) -> bool {
        true
    }

    /// Whether the column is loaded. Light never propagates into unloaded columns.
    fn has_chunk(&self, pos: ChunkPos) -> bool;

    /// The block at `pos`. `Ok(None)` means the world has no data there; the
    /// engine then treats the voxel as opaque and dark.
    fn block(&self, pos: BlockPos) -> anyhow::Result<Option<BlockProperties>>;

    /// Replaces the block at `pos`.
    fn set_block(&self, pos: BlockPos, block: &BlockProperties) -> anyhow::Result<()>;

    /// Light previously written back through [`VoxelWorld::set_block_light`].
    fn block_light(&self, _pos: BlockPos) -> Option<u8> {
        None
    }

    /// Light previously written back through [`VoxelWorld::set_sky_light`].
    fn sky_light(&self, _pos: BlockPos) -> Option<u8> {
        None
    }

    /// Receives block light when write-back is enabled.
    fn set_block_light(&self, _pos: BlockPos, _level: u8) {}

    /// Receives sky light when write-back is enabled.
    fn set_sky_light(&self, _pos: BlockPos, _level: u8) {}

    /// Optional fast column-top lookup. Without it the engine scans columns itself.
    fn heightmap(&self) -> Option<&dyn HeightmapProvider> {
        None
    }
}

/// Answers where sky light stops descending in a column.
pub trait HeightmapProvider: Send + Sync {
    /// The highest y in world column `(x, z)` holding an opaque block, or `None`
    /// when the whole column is open.
    fn sky_top(&self, x: i32, z: i32) -> anyhow::Result<Option<i32>>;
}
