//! Both light channels of one chunk column.

use lumen_utils::ChunkPos;

use super::{light_storage::LightStorage, sky_light_sources::ChunkSkyLightSources};
use crate::block::LightChannel;

/// Light of a full-height chunk column, split into 16-high sections per channel.
///
/// Every change is stamped with the holder's logical time so updates can report
/// which chunks they touched.
#[derive(Debug, Clone)]
pub struct ChunkLight {
    pos: ChunkPos,
    min_y: i32,
    height: i32,
    block: Box<[LightStorage]>,
    sky: Box<[LightStorage]>,
    sky_sources: ChunkSkyLightSources,
    modified_at: u64,
}

impl ChunkLight {
    /// A dark column covering `min_y..height`.
    #[must_use]
    pub fn new(pos: ChunkPos, min_y: i32, height: i32) -> Self {
        let sections = section_count(min_y, height);
        Self {
            pos,
            min_y,
            height,
            block: vec![LightStorage::new_empty(); sections].into_boxed_slice(),
            sky: vec![LightStorage::new_empty(); sections].into_boxed_slice(),
            sky_sources: ChunkSkyLightSources::new(min_y),
            modified_at: 0,
        }
    }

    /// The column's position.
    #[must_use]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Lowest y stored.
    #[must_use]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Exclusive top y.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Logical time of the last change.
    #[must_use]
    pub fn modified_at(&self) -> u64 {
        self.modified_at
    }

    /// Cached sky tops of this column's 256 (x, z) columns.
    #[must_use]
    pub fn sky_sources(&self) -> &ChunkSkyLightSources {
        &self.sky_sources
    }

    /// Mutable access to the cached sky tops.
    pub fn sky_sources_mut(&mut self) -> &mut ChunkSkyLightSources {
        &mut self.sky_sources
    }

    /// Whether `y` lies inside the column.
    #[must_use]
    pub fn contains_y(&self, y: i32) -> bool {
        (self.min_y..self.height).contains(&y)
    }

    fn sections(&self, channel: LightChannel) -> &[LightStorage] {
        match channel {
            LightChannel::Block => &self.block,
            LightChannel::Sky => &self.sky,
        }
    }

    fn sections_mut(&mut self, channel: LightChannel) -> &mut [LightStorage] {
        match channel {
            LightChannel::Block => &mut self.block,
            LightChannel::Sky => &mut self.sky,
        }
    }

    /// Light at local `x`/`z` and world `y`. `y` must be inside the column.
    #[must_use]
    #[inline]
    pub fn get(&self, channel: LightChannel, x: usize, y: i32, z: usize) -> u8 {
        debug_assert!(self.contains_y(y), "y {y} outside of chunk");
        let rel = (y - self.min_y) as usize;
        self.sections(channel)[rel >> 4].get(x, rel & 15, z)
    }

    /// Writes light and stamps the chunk with `now` if the value changed.
    #[inline]
    pub fn set(&mut self, channel: LightChannel, x: usize, y: i32, z: usize, level: u8, now: u64) -> bool {
        debug_assert!(self.contains_y(y), "y {y} outside of chunk");
        let rel = (y - self.min_y) as usize;
        let changed = self.sections_mut(channel)[rel >> 4].set(x, rel & 15, z, level);
        if changed {
            self.modified_at = now;
        }
        changed
    }

    /// Every lit voxel of a channel as `(x, y, z, level)`, skipping dark sections.
    #[must_use]
    pub fn lit_voxels(&self, channel: LightChannel) -> Vec<(usize, i32, usize, u8)> {
        let mut lit = Vec::new();
        for (index, section) in self.sections(channel).iter().enumerate() {
            if section.is_dark() {
                continue;
            }
            let base_y = self.min_y + (index as i32) * 16;
            for sy in 0..16 {
                let y = base_y + sy as i32;
                if y >= self.height {
                    break;
                }
                for z in 0..16 {
                    for x in 0..16 {
                        let level = section.get(x, sy, z);
                        if level > 0 {
                            lit.push((x, y, z, level));
                        }
                    }
                }
            }
        }
        lit
    }
}

/// Number of 16-high sections needed to cover `min_y..height`.
#[must_use]
pub fn section_count(min_y: i32, height: i32) -> usize {
    (height - min_y).max(0).unsigned_abs().div_ceil(16) as usize
}
