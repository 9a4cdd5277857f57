//! Log output for the demo binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

/// Installs a `tracing` subscriber and routes `log` records into it.
pub fn init() -> anyhow::Result<()> {
    tracing_log::LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
