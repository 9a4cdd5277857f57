//! Sky light column initialization.
//!
//! Sky light is seeded top-down: every voxel above a column's highest opaque
//! block is lit at 15 directly, filtering blocks included. Light reaches
//! everything below a top through the sideways flood fill.

use lumen_utils::{BlockPos, ChunkPos};

use super::{
    base::{LightChunkAccess, LightEngine},
    direction::Direction,
    queue_entry::{DirectionSet, QueueEntry},
};
use crate::{
    block::{LightChannel, MAX_LIGHT_LEVEL},
    chunk::sky_light_sources::{ChunkSkyLightSources, UNKNOWN_TOP},
    error::LightError,
};

/// Where column tops come from. Chosen once when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTopSource {
    /// Ask the world's heightmap.
    Heightmap,
    /// Walk the column from the top of the world.
    Scan,
}

/// Seeds sky light into whole chunks or single columns.
#[derive(Debug, Clone)]
pub struct SkyLightEngine {
    directional_hints: bool,
    top_source: ColumnTopSource,
}

fn raise(access: &mut impl LightChunkAccess, pos: BlockPos, level: u8) -> bool {
    if access.get_light(LightChannel::Sky, pos) >= level {
        return false;
    }
    access.set_light(LightChannel::Sky, pos, level);
    true
}

impl SkyLightEngine {
    /// Creates a sky engine.
    #[must_use]
    pub fn new(directional_hints: bool, top_source: ColumnTopSource) -> Self {
        Self {
            directional_hints,
            top_source,
        }
    }

    /// Whether seeds carry direction hints.
    #[must_use]
    pub fn directional_hints(&self) -> bool {
        self.directional_hints
    }

    /// The highest opaque voxel of world column `(x, z)`, or `min_y - 1` for an
    /// open column.
    pub fn column_top(&self, access: &mut impl LightChunkAccess, x: i32, z: i32) -> Result<i32, LightError> {
        let (min_y, height) = (access.min_y(), access.height());
        if self.top_source == ColumnTopSource::Heightmap {
            let from_heightmap = match access.heightmap() {
                Some(heightmap) => Some(heightmap.sky_top(x, z)?),
                None => None,
            };
            if let Some(top) = from_heightmap {
                return Ok(top.map_or(min_y - 1, |top| top.clamp(min_y - 1, height - 1)));
            }
        }

        for y in (min_y..height).rev() {
            if access.block(BlockPos::new(x, y, z))?.is_opaque {
                return Ok(y);
            }
        }
        Ok(min_y - 1)
    }

    /// Computes every column top of `chunk` and seeds its sky light into `engine`.
    pub fn initialize_chunk(
        &self,
        access: &mut impl LightChunkAccess,
        engine: &mut LightEngine,
        chunk: ChunkPos,
    ) -> Result<(), LightError> {
        let mut tops = ChunkSkyLightSources::new(access.min_y());
        for z in 0..16 {
            for x in 0..16 {
                let column = chunk.block_at(x, 0, z);
                tops.set(x, z, self.column_top(access, column.x(), column.z())?);
            }
        }
        access.sky_sources(chunk).clone_from(&tops);

        for z in 0..16 {
            for x in 0..16 {
                self.fill_column(access, engine, chunk, x, z, &tops)?;
            }
        }
        Ok(())
    }

    /// Refreshes the top of the column containing `pos` and clears the part of
    /// it whose sky light may change.
    pub fn retract_column(
        &self,
        access: &mut impl LightChunkAccess,
        engine: &mut LightEngine,
        pos: BlockPos,
    ) -> Result<(), LightError> {
        let chunk = pos.chunk_pos();
        let (x, z) = (pos.local_x(), pos.local_z());
        let old_top = access.sky_sources(chunk).get(x, z);
        let new_top = self.column_top(access, pos.x(), pos.z())?;
        access.sky_sources(chunk).set(x, z, new_top);

        let height = access.height();
        let bound = if old_top == UNKNOWN_TOP {
            height - 1
        } else {
            old_top.max(new_top).max(pos.y()).min(height - 1)
        };
        for y in access.min_y()..=bound {
            engine.retract(access, BlockPos::new(pos.x(), y, pos.z()));
        }
        Ok(())
    }

    /// Seeds the column containing `pos` again and lets lit neighbours of `pos` flow back in.
    pub fn refill_column(
        &self,
        access: &mut impl LightChunkAccess,
        engine: &mut LightEngine,
        pos: BlockPos,
    ) -> Result<(), LightError> {
        let chunk = pos.chunk_pos();
        let sources = access.sky_sources(chunk).clone();
        self.fill_column(access, engine, chunk, pos.local_x(), pos.local_z(), &sources)?;
        engine.reflood_around(access, pos);
        Ok(())
    }

    fn fill_column(
        &self,
        access: &mut impl LightChunkAccess,
        engine: &mut LightEngine,
        chunk: ChunkPos,
        x: usize,
        z: usize,
        sources: &ChunkSkyLightSources,
    ) -> Result<(), LightError> {
        let (min_y, height) = (access.min_y(), access.height());
        let top = sources.get(x, z);
        debug_assert!(top != UNKNOWN_TOP, "column top must be known before filling");

        for y in (top + 1).max(min_y)..height {
            let pos = chunk.block_at(x, y, z);
            if raise(access, pos, MAX_LIGHT_LEVEL) {
                let hints = self.direct_hints(sources, x, y, z);
                if !hints.is_empty() {
                    engine.enqueue_increase(pos, QueueEntry::new(MAX_LIGHT_LEVEL, hints));
                }
            }
        }

        // A heightmap may report a top that still lets light through.
        let walk_hints = if self.directional_hints {
            DirectionSet::HORIZONTAL
        } else {
            DirectionSet::all()
        };
        let mut level = MAX_LIGHT_LEVEL;
        let mut y = top.min(height - 1);
        while y >= min_y {
            let pos = chunk.block_at(x, y, z);
            level = access.block(pos)?.attenuate(level);
            if level == 0 {
                break;
            }
            if raise(access, pos, level) {
                engine.enqueue_increase(pos, QueueEntry::new(level, walk_hints));
            }
            y -= 1;
        }
        Ok(())
    }

    /// Horizontal directions a directly lit voxel should spread to.
    ///
    /// In-chunk neighbours that are themselves directly lit cannot gain
    /// anything. Neighbours across the chunk edge are always explored.
    fn direct_hints(&self, sources: &ChunkSkyLightSources, x: usize, y: i32, z: usize) -> DirectionSet {
        if !self.directional_hints {
            return DirectionSet::all();
        }
        let mut hints = DirectionSet::empty();
        for dir in Direction::HORIZONTAL {
            let (dx, _, dz) = dir.offset();
            let (nx, nz) = (x as i32 + dx, z as i32 + dz);
            let in_chunk = (0..16).contains(&nx) && (0..16).contains(&nz);
            if !in_chunk || !sources.is_directly_lit(nx as usize, y, nz as usize) {
                hints |= DirectionSet::of(dir);
            }
        }
        hints
    }
}
