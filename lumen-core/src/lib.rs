//! # Lumen Core
//!
//! Block and sky light propagation for chunked voxel worlds. The engine keeps
//! its own light store and reads blocks from a caller-supplied [`VoxelWorld`].
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(
    clippy::single_call_fn,
    clippy::multiple_inherent_impl,
    clippy::shadow_unrelated,
    clippy::missing_errors_doc,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value,
    clippy::cargo_common_metadata,
    clippy::module_name_repetitions
)]

pub mod block;
pub mod chunk;
pub mod config;
pub mod error;
pub mod light_world;
pub mod stats;
pub mod world;

pub use block::{BlockProperties, LightChannel, LightChannels};
pub use chunk::light_engine::ColumnUpdate;
pub use chunk::light_holder::{LightHolder, LightSnapshot};
pub use config::LightConfig;
pub use error::{ConfigError, LightError};
pub use light_world::LightWorld;
pub use stats::LightStats;
pub use world::{HeightmapProvider, MemoryWorld, VoxelWorld};
