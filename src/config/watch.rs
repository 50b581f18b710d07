use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Watch delivery parameters
///
/// ```toml
/// [watch]
/// enable_metrics = false
/// keep_tombstones = false
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Record per-event prometheus counters during dispatch
    ///
    /// Commit counters are always recorded; this only covers the per-event
    /// `watch_events_dispatched_total` family, which is the hot one.
    ///
    /// **Default**: false
    #[serde(default = "default_enable_metrics")]
    pub enable_metrics: bool,

    /// Keep pre-deletion snapshots after their deletion has been delivered
    ///
    /// Remote merges only carry identifiers, so a deletion arriving that way can
    /// only be described to watchers while its snapshot is around. Snapshots not
    /// yet delivered are always kept. When on, delivered snapshots are kept too
    /// until [`crate::Graph::purge_tombstones`] is called.
    ///
    /// **Default**: false
    #[serde(default = "default_keep_tombstones")]
    pub keep_tombstones: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enable_metrics: default_enable_metrics(),
            keep_tombstones: default_keep_tombstones(),
        }
    }
}

impl WatchConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn default_enable_metrics() -> bool {
    false
}

fn default_keep_tombstones() -> bool {
    false
}
