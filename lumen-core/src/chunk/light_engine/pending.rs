//! Propagation that ran into unloaded chunks, kept until they load.

use lumen_utils::{BlockPos, ChunkPos};
use rustc_hash::FxHashMap;

use super::direction::Direction;
use crate::block::LightChannel;

/// Light that tried to step from `source` into an unloaded chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingLight {
    /// The voxel the light should enter.
    pub target: BlockPos,
    /// Direction of travel from the emitting voxel into `target`.
    pub direction: Direction,
    /// Level of the emitting voxel when recorded. The target's own filter applies on replay.
    pub level: u8,
    /// Channel the light belongs to.
    pub channel: LightChannel,
    /// Chunk the emitting voxel lives in.
    pub source: ChunkPos,
}

type PendingKey = (BlockPos, Direction, LightChannel);

/// Deferred cross-chunk propagation, grouped by target chunk.
///
/// Each `(target, direction)` pair has exactly one emitting voxel, so repeated
/// attempts collapse into the brightest one.
#[derive(Debug, Default)]
pub struct PendingLightTable {
    by_target: FxHashMap<ChunkPos, FxHashMap<PendingKey, PendingLight>>,
}

impl PendingLightTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an attempt, keeping the brighter one on collision.
    pub fn defer(&mut self, pending: PendingLight) {
        let key = (pending.target, pending.direction, pending.channel);
        self.by_target
            .entry(pending.target.chunk_pos())
            .or_default()
            .entry(key)
            .and_modify(|existing| {
                if pending.level > existing.level {
                    *existing = pending;
                }
            })
            .or_insert(pending);
    }

    /// Removes and returns every entry of `channel` aimed at `chunk`.
    pub fn take(&mut self, chunk: ChunkPos, channel: LightChannel) -> Vec<PendingLight> {
        let Some(entries) = self.by_target.get_mut(&chunk) else {
            return Vec::new();
        };
        let mut taken = Vec::new();
        entries.retain(|_, pending| {
            if pending.channel == channel {
                taken.push(*pending);
                false
            } else {
                true
            }
        });
        if entries.is_empty() {
            self.by_target.remove(&chunk);
        }
        // Deterministic replay order.
        taken.sort_unstable_by_key(|pending| {
            (pending.target.y(), pending.target.z(), pending.target.x(), pending.direction)
        });
        taken
    }

    /// Drops entries aimed at `chunk` and entries recorded by its own propagation.
    ///
    /// Returns how many entries were removed.
    pub fn drop_chunk(&mut self, chunk: ChunkPos) -> usize {
        let mut dropped = self.by_target.remove(&chunk).map_or(0, |entries| entries.len());
        self.by_target.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|_, pending| pending.source != chunk);
            dropped += before - entries.len();
            !entries.is_empty()
        });
        dropped
    }

    /// Number of entries aimed at `chunk`.
    #[must_use]
    pub fn pending_for(&self, chunk: ChunkPos) -> usize {
        self.by_target.get(&chunk).map_or(0, FxHashMap::len)
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_target.values().map(FxHashMap::len).sum()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastward(target: BlockPos, level: u8) -> PendingLight {
        PendingLight {
            target,
            direction: Direction::East,
            level,
            channel: LightChannel::Block,
            source: Direction::West.relative(target).chunk_pos(),
        }
    }

    #[test]
    fn brighter_attempt_wins() {
        let mut table = PendingLightTable::new();
        let target = BlockPos::new(16, 64, 5);
        table.defer(eastward(target, 4));
        table.defer(eastward(target, 9));
        table.defer(eastward(target, 2));
        assert_eq!(table.len(), 1);

        let taken = table.take(ChunkPos::new(1, 0), LightChannel::Block);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].level, 9);
        assert!(table.is_empty());
    }

    #[test]
    fn take_leaves_other_channels() {
        let mut table = PendingLightTable::new();
        let target = BlockPos::new(16, 64, 5);
        table.defer(eastward(target, 4));
        table.defer(PendingLight {
            channel: LightChannel::Sky,
            ..eastward(target, 15)
        });

        assert_eq!(table.take(ChunkPos::new(1, 0), LightChannel::Sky).len(), 1);
        assert_eq!(table.pending_for(ChunkPos::new(1, 0)), 1);
        assert!(table.take(ChunkPos::new(5, 5), LightChannel::Block).is_empty());
    }

    #[test]
    fn dropping_a_chunk_removes_both_directions() {
        let mut table = PendingLightTable::new();
        // Chunk 0 into 1, 1 into 2 and 2 into 3.
        table.defer(eastward(BlockPos::new(16, 64, 0), 7));
        table.defer(eastward(BlockPos::new(32, 64, 0), 3));
        table.defer(eastward(BlockPos::new(48, 64, 0), 3));

        assert_eq!(table.drop_chunk(ChunkPos::new(1, 0)), 2);
        assert_eq!(table.len(), 1);
        assert_eq!(table.pending_for(ChunkPos::new(3, 0)), 1);
    }
}
