//! FIFO work list for one propagation pass.

use std::collections::VecDeque;

use lumen_utils::BlockPos;

use super::queue_entry::QueueEntry;

/// A FIFO queue of voxels waiting to be expanded or cleared.
///
/// Backed by a ring buffer that keeps its allocation between passes.
#[derive(Debug)]
pub struct LightQueue {
    entries: VecDeque<(BlockPos, QueueEntry)>,
    peak: usize,
}

impl LightQueue {
    /// A queue with room for 4096 entries before it grows.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// A queue with room for `capacity` entries before it grows.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            peak: 0,
        }
    }

    /// Appends a voxel to the back.
    #[inline]
    pub fn enqueue(&mut self, pos: BlockPos, entry: QueueEntry) {
        self.entries.push_back((pos, entry));
        self.peak = self.peak.max(self.entries.len());
    }

    /// Takes the oldest voxel.
    #[inline]
    pub fn dequeue(&mut self) -> Option<(BlockPos, QueueEntry)> {
        self.entries.pop_front()
    }

    /// Checks if the queue is empty.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries in the queue.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Largest length reached since creation.
    #[must_use]
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
