//! Flood-fill light propagation.

mod access;
mod base;
mod chunk_cache;
pub mod column_scheduler;
pub mod direction;
pub mod light_queue;
pub mod pending;
pub mod queue_entry;
mod sky_light_engine;

// Re-export main types for convenience
pub use access::WorldLightAccess;
pub use base::{LightChunkAccess, LightEngine};
pub use chunk_cache::ChunkCache;
pub use column_scheduler::{ColumnJob, ColumnScheduler, ColumnUpdate, UpdateResult};
pub use direction::Direction;
pub use light_queue::LightQueue;
pub use pending::{PendingLight, PendingLightTable};
pub use queue_entry::{DirectionSet, QueueEntry};
pub use sky_light_engine::{ColumnTopSource, SkyLightEngine};
