// Layered configuration
// Built-in defaults <- optional config file <- CONSENSUS__* environment variables

use crate::analysts::PanelThresholds;
use crate::consensus::AggregatorConfig;
use crate::indicators::IndicatorParams;
use crate::learning::LearnerConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "consensus.toml";

/// Environment variable prefix (`CONSENSUS__AGGREGATOR__THRESHOLD=10`)
pub const ENV_PREFIX: &str = "CONSENSUS";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Redis,
    Memory,
}

/// Where the weight document lives
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
    pub redis_url: String,
    pub redis_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data/weights.json"), // file backend only
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_key: "consensusbot:weights".to_string(),
        }
    }
}

/// Every tunable of the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub indicators: IndicatorParams,
    pub panel: PanelThresholds,
    pub aggregator: AggregatorConfig,
    pub learner: LearnerConfig,
    pub storage: StorageConfig,
}

impl Settings {
    /// Load settings
    ///
    /// # Arguments
    /// * `path` - Config file that must exist; when `None`, `consensus.toml` in
    ///   the working directory is read if present
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let settings: Settings = Config::builder()
            .add_source(File::from(file).required(path.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        tracing::debug!("Loaded settings: {:?}", settings);

        Ok(settings)
    }
}
