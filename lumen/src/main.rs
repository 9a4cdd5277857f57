//! # Lumen
//!
//! Lights a small in-memory scene and prints slices of the result.
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
    clippy::cargo_common_metadata
)]

use std::{env, path::PathBuf, sync::Arc};

use futures::future::join_all;
use lumen_core::{
    ColumnUpdate, LightChannel, LightConfig, LightWorld, MemoryWorld,
    world::blocks::{AIR, GLOWSTONE},
};
use lumen_utils::BlockPos;

mod logger;
mod scene;

const CONFIG_PATH: &str = "config/lumen_config.json5";

fn main() -> anyhow::Result<()> {
    logger::init()?;

    let config_path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_PATH), PathBuf::from);
    let config = LightConfig::load_or_create(&config_path)?;
    log::info!("Loaded {config:?} from {}", config_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: LightConfig) -> anyhow::Result<()> {
    let world = Arc::new(scene::build()?);
    let engine = LightWorld::with_config(world, config);

    let chunks = scene::chunks();
    let results = join_all(
        chunks
            .iter()
            .map(|&chunk| engine.request_column_update(chunk)),
    )
    .await;
    for (chunk, result) in chunks.iter().zip(results) {
        match result? {
            ColumnUpdate::Completed(affected) => {
                log::info!("Column {chunk} lit, {} chunks touched", affected.len());
            }
            ColumnUpdate::Cancelled => log::info!("Column {chunk} superseded"),
        }
    }

    print_slices(&engine, scene::FLOOR_Y + 1);

    // Knock a hole in the roof and move the glowstone out from under it.
    let changed = engine.set_block(BlockPos::new(14, 66, 7), AIR)?;
    log::info!("Opening the roof touched {} chunks", changed.len());
    engine.set_block(BlockPos::new(15, 60, 7), AIR)?;
    let update = engine
        .set_block_and_update(BlockPos::new(4, 60, 4), GLOWSTONE)
        .await?;
    log::info!("Moved the glowstone: {update:?}");

    print_slices(&engine, scene::FLOOR_Y + 1);
    println!("{}", engine.stats());
    Ok(())
}

fn print_slices(engine: &LightWorld<MemoryWorld>, y: i32) {
    for channel in LightChannel::ALL {
        println!("{channel:?} light at y = {y}:");
        println!("{}", engine.light_levels_string(0, 0, y, 19, 15, channel));
    }
}
