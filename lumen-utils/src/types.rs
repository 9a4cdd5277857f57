// Wrapper types making it harder to accidentaly mix up chunk and block coordinates.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::math::{vector2::Vector2, vector3::Vector3};

/// Width of a chunk column along x and z.
pub const CHUNK_WIDTH: i32 = 16;

/// A chunk column position. `.0.y` is the chunk's z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos(pub Vector2<i32>);

/// A voxel position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos(pub Vector3<i32>);

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk's x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The chunk's z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// World x of the chunk's western edge.
    #[must_use]
    pub const fn min_block_x(self) -> i32 {
        self.0.x * CHUNK_WIDTH
    }

    /// World z of the chunk's northern edge.
    #[must_use]
    pub const fn min_block_z(self) -> i32 {
        self.0.y * CHUNK_WIDTH
    }

    /// World position of a voxel given its local column coordinates.
    #[must_use]
    pub const fn block_at(self, local_x: usize, y: i32, local_z: usize) -> BlockPos {
        BlockPos::new(
            self.min_block_x() + local_x as i32,
            y,
            self.min_block_z() + local_z as i32,
        )
    }

    /// Returns the chunk offset by `dx`/`dz` chunks.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dz)
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}

impl BlockPos {
    /// Creates a block position from world coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The world x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The world y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The world z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// The chunk column containing this voxel.
    #[must_use]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.0.x.div_euclid(CHUNK_WIDTH), self.0.z.div_euclid(CHUNK_WIDTH))
    }

    /// The x coordinate inside the chunk, `0..16`.
    #[must_use]
    pub const fn local_x(self) -> usize {
        self.0.x.rem_euclid(CHUNK_WIDTH) as usize
    }

    /// The z coordinate inside the chunk, `0..16`.
    #[must_use]
    pub const fn local_z(self) -> usize {
        self.0.z.rem_euclid(CHUNK_WIDTH) as usize
    }

    /// Returns the position moved by the given deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_map_to_the_right_chunk() {
        let pos = BlockPos::new(-1, 64, -17);
        assert_eq!(pos.chunk_pos(), ChunkPos::new(-1, -2));
        assert_eq!(pos.local_x(), 15);
        assert_eq!(pos.local_z(), 15);
    }

    #[test]
    fn block_at_inverts_local_coordinates() {
        let chunk = ChunkPos::new(-3, 2);
        let pos = chunk.block_at(4, 10, 9);
        assert_eq!(pos.chunk_pos(), chunk);
        assert_eq!((pos.local_x(), pos.local_z()), (4, 9));
    }

    #[test]
    fn chunk_pos_serializes_as_plain_coordinates() {
        let json = serde_json::to_string(&ChunkPos::new(1, -2)).expect("serialize");
        let back: ChunkPos = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ChunkPos::new(1, -2));
    }
}
