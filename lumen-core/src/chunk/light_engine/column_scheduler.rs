//! Per-column update queue with supersession.
//!
//! Requests move through idle → pending → running → idle. A newer request for a
//! column that is still pending replaces it; the replaced caller is told
//! [`ColumnUpdate::Cancelled`]. Jobs are drained by whichever caller holds the
//! drain lock, so at most one recomputation runs at a time.

use std::collections::VecDeque;

use lumen_utils::ChunkPos;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard, oneshot};

use crate::{block::LightChannels, error::LightError};

/// Outcome of a column update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnUpdate {
    /// The column was relit; these chunks changed while it ran.
    Completed(Vec<ChunkPos>),
    /// A newer request for the same column superseded this one and will report instead.
    Cancelled,
}

/// Result delivered to a waiting requester.
pub type UpdateResult = Result<ColumnUpdate, LightError>;

/// A dequeued request, ready to run.
#[derive(Debug)]
pub struct ColumnJob {
    /// The column to relight.
    pub pos: ChunkPos,
    /// Generation the request was submitted with.
    pub generation: u64,
    /// Channels to recompute.
    pub channels: LightChannels,
    done: oneshot::Sender<UpdateResult>,
}

impl ColumnJob {
    /// Hands the result to the requester.
    pub fn complete(self, result: UpdateResult) {
        // The requester may have given up waiting.
        let _ = self.done.send(result);
    }
}

#[derive(Debug)]
struct PendingRequest {
    channels: LightChannels,
    done: oneshot::Sender<UpdateResult>,
}

#[derive(Debug)]
struct ColumnSlot {
    generation: u64,
    /// `None` while the latest generation is running.
    pending: Option<PendingRequest>,
}

#[derive(Debug, Default)]
struct SchedulerState {
    slots: FxHashMap<ChunkPos, ColumnSlot>,
    queue: VecDeque<(ChunkPos, u64)>,
    next_generation: u64,
    cancelled: u64,
}

/// Serializes and supersedes column update requests.
#[derive(Debug, Default)]
pub struct ColumnScheduler {
    state: Mutex<SchedulerState>,
    drain_lock: AsyncMutex<()>,
}

impl ColumnScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request and returns where its result will arrive.
    ///
    /// A still pending request for the same column is cancelled and its
    /// channels are folded into the new one.
    pub fn submit(&self, pos: ChunkPos, channels: LightChannels) -> oneshot::Receiver<UpdateResult> {
        let (done, receiver) = oneshot::channel();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.next_generation += 1;
        let generation = state.next_generation;
        let mut channels = channels;

        let slot = state.slots.entry(pos).or_insert(ColumnSlot {
            generation,
            pending: None,
        });
        if let Some(previous) = slot.pending.take() {
            channels |= previous.channels;
            let _ = previous.done.send(Ok(ColumnUpdate::Cancelled));
            state.cancelled += 1;
            log::debug!("Column update for {pos} superseded by generation {generation}");
        }
        slot.generation = generation;
        slot.pending = Some(PendingRequest { channels, done });
        state.queue.push_back((pos, generation));
        receiver
    }

    /// Pops the next runnable job, skipping superseded queue entries.
    pub fn next_job(&self) -> Option<ColumnJob> {
        let mut state = self.state.lock();
        loop {
            let (pos, generation) = state.queue.pop_front()?;
            let Some(slot) = state.slots.get_mut(&pos) else {
                continue;
            };
            if slot.generation != generation {
                continue;
            }
            let Some(request) = slot.pending.take() else {
                continue;
            };
            return Some(ColumnJob {
                pos,
                generation,
                channels: request.channels,
                done: request.done,
            });
        }
    }

    /// Marks a job as done; the column goes idle unless a newer request arrived meanwhile.
    pub fn finish(&self, pos: ChunkPos, generation: u64) {
        let mut state = self.state.lock();
        if state
            .slots
            .get(&pos)
            .is_some_and(|slot| slot.generation == generation && slot.pending.is_none())
        {
            state.slots.remove(&pos);
        }
    }

    /// Drops all scheduler state of a column, cancelling its pending request.
    pub fn forget(&self, pos: ChunkPos) -> bool {
        let mut state = self.state.lock();
        let Some(slot) = state.slots.remove(&pos) else {
            return false;
        };
        if let Some(request) = slot.pending {
            let _ = request.done.send(Ok(ColumnUpdate::Cancelled));
            state.cancelled += 1;
        }
        true
    }

    /// Waits until this caller may drain the queue.
    pub async fn lock_drain(&self) -> AsyncMutexGuard<'_, ()> {
        self.drain_lock.lock().await
    }

    /// Number of columns with a request waiting to run.
    #[must_use]
    pub fn pending_columns(&self) -> usize {
        self.state
            .lock()
            .slots
            .values()
            .filter(|slot| slot.pending.is_some())
            .count()
    }

    /// Requests resolved as cancelled so far.
    #[must_use]
    pub fn cancelled(&self) -> u64 {
        self.state.lock().cancelled
    }
}
