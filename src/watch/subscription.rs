use std::fmt;
use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use parking_lot::RwLock;
use tracing::debug;
use tracing::warn;

use super::Facet;
use super::Filters;
use super::Predicate;
use super::RegisteredWatch;
use super::WatchDelegate;
use super::WatchId;
use super::WatchStatus;
use super::Watchable;
use crate::ChangeListener;
use crate::Entity;
use crate::Graph;
use crate::ListenerKey;
use crate::NodeClass;
use crate::Source;

/// A live subscription to the changes of one graph.
///
/// A new watch has no criteria and matches nothing; narrow it with
/// [`Watch::for_types`], [`Watch::has_tags`], [`Watch::member_of`] and
/// [`Watch::where_properties`]. Criteria of different facets are ORed, calls
/// for the same facet are ANDed.
///
/// Dropping the watch detaches it from the graph. Events are delivered to a
/// delegate set with [`Watch::set_delegate`], which the watch only holds
/// weakly.
///
/// ```ignore
/// let watch: Watch = Watch::new(&graph);
/// watch.for_types(&["User"]).has_tags(&["Admin"]);
/// watch.set_delegate(&delegate);
/// ```
pub struct Watch<T: Watchable = Entity> {
    shared: Arc<WatchShared<T>>,
}

pub(crate) struct WatchShared<T: Watchable> {
    pub(super) id: WatchId,
    pub(super) graph: Graph,
    pub(super) filters: RwLock<Filters>,
    delegate: RwLock<Option<Weak<dyn WatchDelegate<T>>>>,
    status: Mutex<WatchStatus>,
    attachment: Mutex<Option<[ListenerKey; 2]>>,
}

impl<T: Watchable> WatchShared<T> {
    pub(super) fn current_status(&self) -> WatchStatus {
        *self.status.lock()
    }

    pub(super) fn delegate(&self) -> Option<Arc<dyn WatchDelegate<T>>> {
        self.delegate.read().as_ref().and_then(Weak::upgrade)
    }

    fn detach_listeners(&self) {
        if let Some(keys) = self.attachment.lock().take() {
            for key in keys {
                self.graph.detach(key);
            }
        }
    }
}

impl<T: Watchable> RegisteredWatch for WatchShared<T> {
    fn id(&self) -> WatchId {
        self.id
    }

    fn class(&self) -> NodeClass {
        T::CLASS
    }

    fn status(&self) -> WatchStatus {
        self.current_status()
    }
}

impl Watch<Entity> {
    /// Registers an entity watch with `graph` and starts it.
    pub fn new(graph: &Graph) -> Self {
        Self::attach(graph)
    }
}

impl<T: Watchable> Watch<T> {
    /// Registers a watch over nodes of `T::CLASS` with `graph` and starts it.
    pub fn attach(graph: &Graph) -> Self {
        let id = graph.watchers().next_id();
        let shared = Arc::new(WatchShared {
            id,
            graph: graph.clone(),
            filters: RwLock::new(Filters::default()),
            delegate: RwLock::new(None),
            status: Mutex::new(WatchStatus::Idle),
            attachment: Mutex::new(None),
        });
        let registered = Arc::downgrade(&shared);
        let registered: Weak<dyn RegisteredWatch> = registered;
        graph.watchers().register(id, registered);

        let watch = Self { shared };
        watch.resume();
        debug!(%id, graph = %graph.name(), "watch created");
        watch
    }

    pub fn id(&self) -> WatchId {
        self.shared.id
    }

    pub fn graph(&self) -> &Graph {
        &self.shared.graph
    }

    pub fn status(&self) -> WatchStatus {
        self.shared.current_status()
    }

    pub fn is_running(&self) -> bool {
        self.status() == WatchStatus::Running
    }

    /// Events go to `delegate` from now on. Only a weak reference is kept:
    /// once the caller drops its last `Arc`, events are discarded.
    pub fn set_delegate<D>(
        &self,
        delegate: &Arc<D>,
    ) -> &Self
    where
        D: WatchDelegate<T> + 'static,
    {
        let weak = Arc::downgrade(delegate);
        let weak: Weak<dyn WatchDelegate<T>> = weak;
        *self.shared.delegate.write() = Some(weak);
        self
    }

    pub fn clear_delegate(&self) -> &Self {
        *self.shared.delegate.write() = None;
        self
    }

    pub fn has_delegate(&self) -> bool {
        self.shared.delegate().is_some()
    }

    fn narrow<S: AsRef<str>>(
        &self,
        facet: Facet,
        values: &[S],
    ) -> &Self {
        let mut filters = self.shared.filters.write();
        filters.narrow(facet, values);
        debug!(
            watch = %self.shared.id,
            ?facet,
            predicate = %filters.compound().map(ToString::to_string).unwrap_or_default(),
            "watch narrowed"
        );
        self
    }

    /// Follow nodes whose type matches any of `types`
    pub fn for_types<S: AsRef<str>>(
        &self,
        types: &[S],
    ) -> &Self {
        self.narrow(Facet::Type, types)
    }

    /// Follow tag records named like any of `tags`
    pub fn has_tags<S: AsRef<str>>(
        &self,
        tags: &[S],
    ) -> &Self {
        self.narrow(Facet::Tag, tags)
    }

    /// Follow group records named like any of `groups`
    pub fn member_of<S: AsRef<str>>(
        &self,
        groups: &[S],
    ) -> &Self {
        self.narrow(Facet::Group, groups)
    }

    /// Follow property records named like any of `properties`
    pub fn where_properties<S: AsRef<str>>(
        &self,
        properties: &[S],
    ) -> &Self {
        self.narrow(Facet::Property, properties)
    }

    /// Drops every criterion; the watch matches nothing until narrowed again.
    pub fn clear(&self) -> &Self {
        self.shared.filters.write().clear();
        debug!(watch = %self.shared.id, "watch criteria cleared");
        self
    }

    /// Attaches to the graph's change channels. No-op when already running.
    pub fn resume(&self) -> &Self {
        let mut status = self.shared.status.lock();
        match *status {
            WatchStatus::Running => return self,
            WatchStatus::Detached => {
                warn!(watch = %self.shared.id, "resume of a detached watch ignored");
                return self;
            }
            WatchStatus::Idle | WatchStatus::Paused => {}
        }

        let listener = Arc::downgrade(&self.shared);
        let listener: Weak<dyn ChangeListener> = listener;
        let local = self.shared.graph.attach(Source::Local, listener.clone());
        let remote = self.shared.graph.attach(Source::Remote, listener);
        *self.shared.attachment.lock() = Some([local, remote]);
        *status = WatchStatus::Running;
        debug!(watch = %self.shared.id, "watch running");
        self
    }

    /// Detaches from the graph's change channels. Changes committed while
    /// paused are never replayed.
    pub fn pause(&self) -> &Self {
        let mut status = self.shared.status.lock();
        if *status != WatchStatus::Running {
            return self;
        }
        self.shared.detach_listeners();
        *status = WatchStatus::Paused;
        debug!(watch = %self.shared.id, "watch paused");
        self
    }

    /// Current compound predicate, `None` while there are no criteria
    pub fn predicate(&self) -> Option<Predicate> {
        self.shared.filters.read().compound().cloned()
    }

    fn values(
        &self,
        facet: Facet,
    ) -> Vec<String> {
        self.shared
            .filters
            .read()
            .facet(facet)
            .map(|filter| filter.values.clone())
            .unwrap_or_default()
    }

    pub fn types(&self) -> Vec<String> {
        self.values(Facet::Type)
    }

    pub fn tags(&self) -> Vec<String> {
        self.values(Facet::Tag)
    }

    pub fn groups(&self) -> Vec<String> {
        self.values(Facet::Group)
    }

    pub fn properties(&self) -> Vec<String> {
        self.values(Facet::Property)
    }
}

impl<T: Watchable> Drop for Watch<T> {
    fn drop(&mut self) {
        {
            let mut status = self.shared.status.lock();
            self.shared.detach_listeners();
            *status = WatchStatus::Detached;
        }
        *self.shared.delegate.write() = None;
        self.shared.graph.watchers().unregister(self.shared.id);
        debug!(watch = %self.shared.id, "watch detached");
    }
}

impl<T: Watchable> fmt::Debug for Watch<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Watch")
            .field("id", &self.shared.id)
            .field("graph", &self.shared.graph.name())
            .field("status", &self.status())
            .field("predicate", &self.shared.filters.read().compound())
            .finish()
    }
}
