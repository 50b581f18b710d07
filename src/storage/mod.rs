mod graph_storage;
mod sled_adapter;

#[doc(hidden)]
pub use graph_storage::*;
#[doc(hidden)]
pub use sled_adapter::*;

use tracing::debug;
use tracing::warn;

use crate::StorageConfig;

/// Opens the sled database backing graph `name`.
pub fn init_sled_graph_db(
    name: &str,
    config: &StorageConfig,
) -> std::result::Result<sled::Db, std::io::Error> {
    debug!(%name, temporary = config.temporary, "init_sled_graph_db");

    let mut sled_config = sled::Config::default()
        .cache_capacity(config.cache_capacity)
        .flush_every_ms(config.flush_every_ms)
        .use_compression(config.use_compression)
        .compression_factor(1);

    let location = if config.temporary {
        sled_config = sled_config.temporary(true);
        None
    } else {
        let path = config.db_root_dir.join(name);
        sled_config = sled_config.path(&path);
        Some(path)
    };

    sled_config.open().map_err(|e| {
        warn!(
            "Try to open graph DB at this location: {:?} and failed: {:?}",
            location, e
        );
        std::io::Error::other(e)
    })
}
