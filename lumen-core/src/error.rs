//! Error types returned by the light engine.

use lumen_utils::ChunkPos;
use thiserror::Error;

/// Errors surfaced by light updates.
///
/// Superseded column requests are not errors; see `ColumnUpdate::Cancelled`.
#[derive(Debug, Error)]
pub enum LightError {
    /// The world does not have the requested column loaded.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),
    /// The world accessor failed. Light written before the failure stays in place.
    #[error("world accessor failed: {0}")]
    Accessor(#[from] anyhow::Error),
    /// A light snapshot does not fit the world it is loaded into.
    #[error(
        "snapshot of chunk {pos} covers y {snapshot_min_y}..{snapshot_height}, world covers {world_min_y}..{world_height}"
    )]
    SnapshotMismatch {
        /// The chunk the snapshot belongs to.
        pos: ChunkPos,
        /// Lowest y of the snapshot.
        snapshot_min_y: i32,
        /// Exclusive top y of the snapshot.
        snapshot_height: i32,
        /// Lowest y of the world.
        world_min_y: i32,
        /// Exclusive top y of the world.
        world_height: i32,
    },
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors produced while loading or validating `LightConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON5 for `LightConfig`.
    #[error("config file is malformed: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is outside its allowed range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
