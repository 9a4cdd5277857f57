//! Shared coordinate types and small math helpers used across the lumen crates.

pub mod math;
pub mod types;

pub use types::{BlockPos, ChunkPos};
