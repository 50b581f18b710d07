//! Change notification channels of a graph.
//!
//! A graph announces every successful local commit on the `Local` channel and
//! every remote merge on the `Remote` channel. Listeners are held weakly; a
//! listener that has gone away is pruned the next time its channel fires.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;

use dashmap::DashMap;
use tracing::trace;

use crate::ChangeSet;
use crate::Graph;

/// Where a batch of changes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Committed through this process
    Local,
    /// Written by a synchronization layer and announced through a merge
    Remote,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Local => "local",
            Source::Remote => "remote",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives the materialized records of a commit or a merge.
///
/// Called synchronously on the committing thread, after the store has made
/// the changes durable and without any graph lock held.
pub trait ChangeListener: Send + Sync {
    fn on_change(
        &self,
        graph: &Graph,
        changes: &ChangeSet,
        source: Source,
    );
}

/// Handle returned by [`ChangeChannels::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    source: Source,
    id: u64,
}

#[derive(Default)]
pub(crate) struct ChangeChannels {
    local: DashMap<u64, Weak<dyn ChangeListener>>,
    remote: DashMap<u64, Weak<dyn ChangeListener>>,
    next_id: AtomicU64,
}

impl ChangeChannels {
    fn channel(
        &self,
        source: Source,
    ) -> &DashMap<u64, Weak<dyn ChangeListener>> {
        match source {
            Source::Local => &self.local,
            Source::Remote => &self.remote,
        }
    }

    pub(crate) fn attach(
        &self,
        source: Source,
        listener: Weak<dyn ChangeListener>,
    ) -> ListenerKey {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channel(source).insert(id, listener);
        trace!(%source, id, "listener attached");
        ListenerKey { source, id }
    }

    pub(crate) fn detach(
        &self,
        key: ListenerKey,
    ) -> bool {
        let removed = self.channel(key.source).remove(&key.id).is_some();
        trace!(source = %key.source, id = key.id, removed, "listener detached");
        removed
    }

    /// Live listeners of one channel, in attach order. Dead entries are pruned.
    ///
    /// The returned snapshot lets callers invoke listeners without holding
    /// any shard lock, so a listener may attach or detach while being called.
    pub(crate) fn live(
        &self,
        source: Source,
    ) -> Vec<Arc<dyn ChangeListener>> {
        let channel = self.channel(source);
        let mut live = Vec::new();
        let mut dead = Vec::new();
        for entry in channel.iter() {
            match entry.value().upgrade() {
                Some(listener) => live.push((*entry.key(), listener)),
                None => dead.push(*entry.key()),
            }
        }
        for id in dead {
            channel.remove(&id);
        }
        live.sort_by_key(|(id, _)| *id);
        live.into_iter().map(|(_, listener)| listener).collect()
    }

    pub(crate) fn len(
        &self,
        source: Source,
    ) -> usize {
        self.channel(source).len()
    }
}
