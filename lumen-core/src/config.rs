//! Engine configuration loaded from `lumen_config.json5`.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("../../package-content/lumen_config.json5");

/// Smallest allowed initial queue capacity.
pub const MIN_QUEUE_CAPACITY: usize = 16;
/// Largest allowed initial queue capacity.
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Tunables of a `LightWorld`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Restrict horizontal sky seeds to directions that can still gain light.
    pub directional_hints: bool,
    /// Copy affected chunks' light into the world's light hooks after each update.
    pub write_back_light: bool,
    /// Initial capacity of the propagation queues.
    pub queue_capacity: usize,
    /// Yield to the runtime between queued column jobs.
    pub yield_between_jobs: bool,
}

impl LightConfig {
    /// Loads the config at `path`, writing the bundled default there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let config_str = fs::read_to_string(path)?;
            Self::from_json5(&config_str)
        } else {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            log::info!("Wrote default light config to {}", path.display());
            Ok(Self::default())
        }
    }

    /// Parses and validates a JSON5 config document.
    pub fn from_json5(config_str: &str) -> Result<Self, ConfigError> {
        let config: LightConfig = serde_json5::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUEUE_CAPACITY..=MAX_QUEUE_CAPACITY).contains(&self.queue_capacity) {
            return Err(ConfigError::Invalid(
                "queue_capacity must be in range 16..=1048576",
            ));
        }
        Ok(())
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            directional_hints: true,
            write_back_light: false,
            queue_capacity: 4096,
            yield_between_jobs: true,
        }
    }
}
