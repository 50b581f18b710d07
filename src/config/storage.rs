use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory; each graph opens `<db_root_dir>/<name>`
    #[serde(default = "default_db_root_dir")]
    pub db_root_dir: PathBuf,

    /// Keep everything in memory and drop it with the graph
    #[serde(default = "default_temporary")]
    pub temporary: bool,

    /// Page cache size in bytes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Background flush interval. `None` flushes only on commit.
    #[serde(default = "default_flush_every_ms")]
    pub flush_every_ms: Option<u64>,

    #[serde(default = "default_use_compression")]
    pub use_compression: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_root_dir: default_db_root_dir(),
            temporary: default_temporary(),
            cache_capacity: default_cache_capacity(),
            flush_every_ms: default_flush_every_ms(),
            use_compression: default_use_compression(),
        }
    }
}

impl StorageConfig {
    /// Validates storage configuration
    /// # Errors
    /// Returns `Error::InvalidConfig` when:
    /// - a persistent store has no root directory
    /// - the cache is empty
    /// - the flush interval is zero
    pub fn validate(&self) -> Result<()> {
        if !self.temporary && self.db_root_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "db_root_dir cannot be empty for a persistent store".into(),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig("cache_capacity must be greater than 0".into()));
        }

        if let Some(0) = self.flush_every_ms {
            return Err(Error::InvalidConfig(
                "flush_every_ms must be greater than 0 (use none to disable)".into(),
            ));
        }

        Ok(())
    }
}

fn default_db_root_dir() -> PathBuf {
    PathBuf::from("./db")
}

fn default_temporary() -> bool {
    false
}

fn default_cache_capacity() -> u64 {
    64 * 1024 * 1024 //64MB
}

fn default_flush_every_ms() -> Option<u64> {
    Some(500)
}

fn default_use_compression() -> bool {
    true
}
