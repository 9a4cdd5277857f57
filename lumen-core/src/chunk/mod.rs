//! Chunk light storage and the propagation engines working on it.

pub mod chunk_light;
pub mod light_engine;
pub mod light_holder;
pub mod light_storage;
pub mod sky_light_sources;
