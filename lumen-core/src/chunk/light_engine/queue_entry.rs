//! Typed propagation hints carried by queued voxels.

use bitflags::bitflags;

use super::direction::Direction;

bitflags! {
    /// A set of directions a queued voxel should still be expanded towards.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirectionSet: u8 {
        /// -Y
        const DOWN = 1 << Direction::Down as u8;
        /// +Y
        const UP = 1 << Direction::Up as u8;
        /// -Z
        const NORTH = 1 << Direction::North as u8;
        /// +Z
        const SOUTH = 1 << Direction::South as u8;
        /// -X
        const WEST = 1 << Direction::West as u8;
        /// +X
        const EAST = 1 << Direction::East as u8;
        /// The four horizontal directions.
        const HORIZONTAL = Self::NORTH.bits() | Self::SOUTH.bits() | Self::WEST.bits() | Self::EAST.bits();
    }
}

impl DirectionSet {
    /// The set holding only `dir`.
    #[must_use]
    pub const fn of(dir: Direction) -> Self {
        Self::from_bits_retain(1 << dir as u8)
    }

    /// Whether `dir` is in the set.
    #[must_use]
    #[inline]
    pub const fn has(self, dir: Direction) -> bool {
        self.contains(Self::of(dir))
    }
}

impl From<Direction> for DirectionSet {
    fn from(dir: Direction) -> Self {
        Self::of(dir)
    }
}

/// What a queued voxel carries through a propagation pass.
///
/// Decrease entries hold the level the voxel had before it was cleared.
/// Increase entries hold the level at enqueue time; the pass rereads the stored
/// value when the entry is popped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    level: u8,
    directions: DirectionSet,
}

impl QueueEntry {
    /// An entry with explicit directions.
    #[must_use]
    pub const fn new(level: u8, directions: DirectionSet) -> Self {
        Self { level, directions }
    }

    /// The carried light level.
    #[must_use]
    #[inline]
    pub const fn level(self) -> u8 {
        self.level
    }

    /// The directions still worth exploring.
    #[must_use]
    #[inline]
    pub const fn directions(self) -> DirectionSet {
        self.directions
    }

    /// Checks if light should propagate in the given direction.
    #[must_use]
    #[inline]
    pub const fn should_propagate(self, dir: Direction) -> bool {
        self.directions.has(dir)
    }

    /// Clearing a voxel that held `level`; every neighbour is inspected.
    #[must_use]
    pub const fn decrease_all_directions(level: u8) -> Self {
        Self::new(level, DirectionSet::all())
    }

    /// Clearing a voxel that was reached from `from`, which is already dark.
    #[must_use]
    pub const fn decrease_skip_one_direction(level: u8, from: Direction) -> Self {
        Self::new(
            level,
            DirectionSet::all().difference(DirectionSet::of(from)),
        )
    }

    /// Light seeded in place, by an emitter or a reflood.
    #[must_use]
    pub const fn increase_all_directions(level: u8) -> Self {
        Self::new(level, DirectionSet::all())
    }

    /// Light that arrived from `from`; going back that way cannot raise anything.
    #[must_use]
    pub const fn increase_skip_one_direction(level: u8, from: Direction) -> Self {
        Self::new(
            level,
            DirectionSet::all().difference(DirectionSet::of(from)),
        )
    }
}
