//! The demo world: a stone floor across a 3x3 chunk area with a few light features.

use lumen_core::{
    BlockProperties, MemoryWorld, VoxelWorld,
    world::blocks::{GLASS, GLOWSTONE, STONE, WATER},
};
use lumen_utils::{BlockPos, ChunkPos};

/// Floor surface height.
pub const FLOOR_Y: i32 = 59;

/// A lantern hanging in open air. Transparent, so sky light passes it.
const LANTERN: BlockProperties = BlockProperties::transparent(30).emitting(14);

/// Chunks making up the scene.
pub fn chunks() -> Vec<ChunkPos> {
    let mut chunks = Vec::with_capacity(9);
    for z in -1..=1 {
        for x in -1..=1 {
            chunks.push(ChunkPos::new(x, z));
        }
    }
    chunks
}

/// Builds the scene into a fresh world.
pub fn build() -> anyhow::Result<MemoryWorld> {
    let world = MemoryWorld::new(0, 128);
    for chunk in chunks() {
        world.load_chunk(chunk);
    }

    world.fill(BlockPos::new(-16, 0, -16), BlockPos::new(31, FLOOR_Y, 31), &STONE)?;
    // A roof spanning the border between the centre chunk and its eastern neighbour.
    world.fill(BlockPos::new(10, 66, 2), BlockPos::new(20, 66, 12), &STONE)?;
    world.fill(BlockPos::new(10, 60, 2), BlockPos::new(10, 65, 12), &GLASS)?;
    world.set_block(BlockPos::new(15, 60, 7), &GLOWSTONE)?;
    // A pond to the west.
    world.fill(BlockPos::new(-8, 57, -6), BlockPos::new(-3, FLOOR_Y, -1), &WATER)?;
    world.set_block(BlockPos::new(2, 64, -10), &LANTERN)?;
    Ok(world)
}
