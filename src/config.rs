//! Configuration System
//!
//! Layered configuration for stores and the CLI. Sources are merged in
//! order: built-in defaults, `config/treelens.toml`,
//! `config/{TREELENS_ENV}.toml`, then `TREELENS_*` environment variables.

use crate::error::StoreError;
use crate::logging::LoggingConfig;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod sources {
    pub mod environment;
    pub mod workspace_file;
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// View cache capacity
    #[serde(default = "default_max_cache")]
    pub max_cache: usize,

    /// Debug mode; implies `validate`
    #[serde(default)]
    pub debug: bool,

    /// Validate every reduced tree against the schema
    #[serde(default)]
    pub validate: bool,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_max_cache() -> usize {
    1024
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_cache: default_max_cache(),
            debug: false,
            validate: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_cache == 0 {
            return Err(StoreError::ConfigError(
                "max_cache must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder seeded with the built-in defaults, the lowest layer.
fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("max_cache", default_max_cache() as u64)?
        .set_default("debug", false)?
        .set_default("validate", false)
}

/// Loads `StoreConfig` from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a project rooted at `root`.
    pub fn load(root: &Path) -> Result<StoreConfig, StoreError> {
        let builder = builder_with_defaults()?;
        let builder = sources::workspace_file::add_to_builder(builder, root)?;
        let builder = sources::environment::add_to_builder(builder);
        let config: StoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from one file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<StoreConfig, StoreError> {
        let config: StoreConfig = builder_with_defaults()?
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default() -> StoreConfig {
        StoreConfig::default()
    }
}
