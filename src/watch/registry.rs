//! Per-graph registry of live watches.
//!
//! Entries are weak: a watch that was dropped without unregistering, for
//! instance during a panic unwind, is treated as gone and pruned lazily.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Weak;

use dashmap::DashMap;
use tracing::trace;

use crate::NodeClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Lifecycle of a watch.
///
/// `Idle` until first resumed, then toggles between `Running` and `Paused`.
/// `Detached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchStatus {
    Idle,
    Running,
    Paused,
    Detached,
}

/// What the registry can ask of a watch without knowing its entity type
pub trait RegisteredWatch: Send + Sync {
    fn id(&self) -> WatchId;

    fn class(&self) -> NodeClass;

    fn status(&self) -> WatchStatus;
}

#[derive(Default)]
pub struct WatcherRegistry {
    watchers: DashMap<WatchId, Weak<dyn RegisteredWatch>>,
    next_id: AtomicU64,
}

impl WatcherRegistry {
    pub(crate) fn next_id(&self) -> WatchId {
        WatchId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub(crate) fn register(
        &self,
        id: WatchId,
        watch: Weak<dyn RegisteredWatch>,
    ) {
        trace!(%id, "watch registered");
        self.watchers.insert(id, watch);
    }

    pub(crate) fn unregister(
        &self,
        id: WatchId,
    ) {
        if self.watchers.remove(&id).is_some() {
            trace!(%id, "watch unregistered");
        }
    }

    /// Number of watches still alive
    pub fn len(&self) -> usize {
        self.watchers.iter().filter(|entry| entry.value().strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of the live watches, ascending
    pub fn ids(&self) -> Vec<WatchId> {
        let mut ids: Vec<WatchId> = self
            .watchers
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .map(|entry| *entry.key())
            .collect();
        ids.sort();
        ids
    }

    /// `None` once the watch is gone
    pub fn status(
        &self,
        id: WatchId,
    ) -> Option<WatchStatus> {
        let watch = self.watchers.get(&id)?.value().upgrade()?;
        Some(watch.status())
    }

    /// Live watches following nodes of `class`
    pub fn count_of(
        &self,
        class: NodeClass,
    ) -> usize {
        self.watchers
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .filter(|watch| watch.class() == class)
            .count()
    }

    /// Drops entries whose watch is gone, returning how many were dropped
    pub fn prune(&self) -> usize {
        let before = self.watchers.len();
        self.watchers.retain(|_, watch| watch.strong_count() > 0);
        before - self.watchers.len()
    }
}
