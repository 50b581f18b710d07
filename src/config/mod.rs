//! Configuration management for graph stores.
//!
//! Provides layered configuration loading with priority:
//! 1. Default values (hardcoded)
//! 2. Config file passed to [`GraphConfig::load`]
//! 3. File named by the `CONFIG_PATH` environment variable
//! 4. Environment variables (highest priority), e.g. `WATCHGRAPH__STORAGE__TEMPORARY=true`

mod storage;
mod watch;
pub use storage::*;
pub use watch::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::DEFAULT_GRAPH_NAME;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GraphConfig {
    /// Graph name. Also the sub-directory of `storage.db_root_dir` holding its data.
    #[serde(default = "default_graph_name")]
    pub name: String,

    /// Embedded database parameters
    #[serde(default)]
    pub storage: StorageConfig,

    /// Watch delivery parameters
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: default_graph_name(),
            storage: StorageConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Load configuration from defaults, an optional file, `CONFIG_PATH` and
    /// `WATCHGRAPH__*` environment variables, in that priority order.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        if let Ok(path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory configuration: nothing touches disk and data is gone on drop.
    pub fn temporary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage: StorageConfig {
                temporary: true,
                ..StorageConfig::default()
            },
            watch: WatchConfig::default(),
        }
    }

    /// Same settings under a different graph name.
    pub fn renamed(
        &self,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("graph name cannot be empty".into()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(Error::InvalidConfig(format!(
                "graph name {:?} must not contain path separators",
                self.name
            )));
        }
        self.storage.validate()?;
        self.watch.validate()?;
        Ok(())
    }
}

fn default_graph_name() -> String {
    DEFAULT_GRAPH_NAME.to_string()
}
