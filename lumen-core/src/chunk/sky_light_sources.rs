//! Per-column sky tops of a chunk.

/// Marker for a column whose top has not been computed yet.
pub const UNKNOWN_TOP: i32 = i32::MAX;

/// Caches, for each of a chunk's 16x16 columns, the highest voxel that stops or
/// filters sky light. Every voxel above it is lit directly by the sky.
///
/// A column with nothing in the way stores `min_y - 1`.
/// Index layout is `z * 16 + x`.
#[derive(Debug, Clone)]
pub struct ChunkSkyLightSources {
    min_y: i32,
    tops: Box<[i32; 256]>,
}

impl ChunkSkyLightSources {
    /// A tracker with every column unknown.
    #[must_use]
    pub fn new(min_y: i32) -> Self {
        Self {
            min_y,
            tops: Box::new([UNKNOWN_TOP; 256]),
        }
    }

    /// The top of a column, or [`UNKNOWN_TOP`].
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> i32 {
        debug_assert!(x < 16 && z < 16, "Column coordinates must be 0-15");
        self.tops[z * 16 + x]
    }

    /// Records the top of a column.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, top: i32) {
        debug_assert!(x < 16 && z < 16, "Column coordinates must be 0-15");
        debug_assert!(top == UNKNOWN_TOP || top >= self.min_y - 1);
        self.tops[z * 16 + x] = top;
    }

    /// Whether the voxel at height `y` in this column is known to see the sky directly.
    #[inline]
    #[must_use]
    pub fn is_directly_lit(&self, x: usize, y: i32, z: usize) -> bool {
        let top = self.get(x, z);
        top != UNKNOWN_TOP && y > top
    }
}
