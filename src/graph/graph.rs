use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use parking_lot::ReentrantMutex;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ChangeChannels;
use super::ChangeListener;
use super::ListenerKey;
use super::Overlay;
use super::Source;
use super::Transaction;
use crate::metrics::GRAPH_COMMITS_METRIC;
use crate::watch::resolve_remote;
use crate::watch::WatcherRegistry;
use crate::ChangeSet;
use crate::GraphConfig;
use crate::GraphStorage;
use crate::NodeRecord;
use crate::Record;
use crate::RecordId;
use crate::RemoteMerge;
use crate::Result;
use crate::SledGraphStorage;
use crate::WatchConfig;

/// Handle to one named graph store.
///
/// Cloning is cheap; every clone shares the same pending transaction,
/// listener channels and watcher registry.
#[derive(Clone)]
pub struct Graph {
    inner: Arc<GraphInner>,
}

struct GraphInner {
    name: String,
    storage: Arc<dyn GraphStorage>,
    config: WatchConfig,
    pending: Mutex<Transaction>,
    /// Serializes commits and merges so change sets reach listeners in
    /// store order. Reentrant: a delegate may commit from inside a callback.
    commit_lock: ReentrantMutex<RefCell<Delivery>>,
    channels: ChangeChannels,
    watchers: WatcherRegistry,
}

/// Delivery bookkeeping of the thread holding `commit_lock`.
#[derive(Default)]
struct Delivery {
    /// Commits and merges currently delivering, nested ones included
    depth: usize,
    /// Deletions delivered so far whose snapshots go once `depth` is back to 0
    delivered: Vec<RecordId>,
}

impl fmt::Debug for Graph {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Graph")
            .field("name", &self.inner.name)
            .field("pending", &self.inner.pending.lock().len())
            .field("watchers", &self.inner.watchers.len())
            .finish()
    }
}

impl PartialEq for Graph {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Graph {}

impl Graph {
    /// Opens the sled database described by `config`.
    pub fn open(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let storage = SledGraphStorage::open(&config.name, &config.storage)?;
        info!(name = %config.name, temporary = config.storage.temporary, "graph opened");
        Ok(Self::with_storage(config.name, Arc::new(storage), config.watch))
    }

    pub fn with_storage(
        name: impl Into<String>,
        storage: Arc<dyn GraphStorage>,
        config: WatchConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GraphInner {
                name: name.into(),
                storage,
                config,
                pending: Mutex::new(Transaction::default()),
                commit_lock: ReentrantMutex::new(RefCell::new(Delivery::default())),
                channels: ChangeChannels::default(),
                watchers: WatcherRegistry::default(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn storage(&self) -> &Arc<dyn GraphStorage> {
        &self.inner.storage
    }

    pub fn watch_config(&self) -> &WatchConfig {
        &self.inner.config
    }

    /// Live subscriptions of this graph
    pub fn watchers(&self) -> &WatcherRegistry {
        &self.inner.watchers
    }

    pub fn next_id(&self) -> Result<RecordId> {
        self.inner.storage.generate_id()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.inner.pending.lock().is_empty()
    }

    /// Reads a record through the pending transaction.
    pub fn read(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>> {
        let pending = self.inner.pending.lock();
        read_through(&pending, self.inner.storage.as_ref(), id)
    }

    /// Node lookup through the pending transaction. `None` for missing ids
    /// and ids naming a facet record.
    pub fn node(
        &self,
        id: RecordId,
    ) -> Result<Option<NodeRecord>> {
        Ok(match self.read(id)? {
            Some(Record::Node(node)) => Some(node),
            _ => None,
        })
    }

    /// Facet records currently owned by `node`, pending changes included.
    pub fn children(
        &self,
        node: RecordId,
    ) -> Result<Vec<Record>> {
        let pending = self.inner.pending.lock();
        children_through(&pending, self.inner.storage.as_ref(), node)
    }

    /// Runs `f` with exclusive access to the pending transaction, so a
    /// read-then-stage sequence cannot interleave with another writer or a
    /// commit.
    pub(crate) fn stage<R>(
        &self,
        f: impl FnOnce(&mut Staging<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut pending = self.inner.pending.lock();
        let mut staging = Staging {
            txn: &mut *pending,
            storage: self.inner.storage.as_ref(),
        };
        f(&mut staging)
    }

    /// Makes every pending change durable, then announces the change set on
    /// the local channel. Blocks until both are done.
    ///
    /// On failure the pending changes are kept, so the caller may retry.
    pub fn commit(&self) -> Result<()> {
        let delivery = self.inner.commit_lock.lock();

        let changes = {
            let mut pending = self.inner.pending.lock();
            if pending.is_empty() {
                debug!(graph = %self.inner.name, "nothing to commit");
                return Ok(());
            }
            let txn = pending.take();
            let changes = txn.to_change_set();

            let durable = self
                .inner
                .storage
                .apply(&changes)
                .and_then(|_| self.inner.storage.flush());
            if let Err(e) = durable {
                error!(graph = %self.inner.name, "commit failed: {:?}", e);
                GRAPH_COMMITS_METRIC
                    .with_label_values(&[self.inner.name.as_str(), "failed"])
                    .inc();
                pending.absorb(txn);
                return Err(e.into_commit_failure());
            }
            changes
        };

        GRAPH_COMMITS_METRIC
            .with_label_values(&[self.inner.name.as_str(), "ok"])
            .inc();
        debug!(
            graph = %self.inner.name,
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len(),
            "commit durable"
        );

        self.deliver(&delivery, &changes, Source::Local);
        Ok(())
    }

    /// Commits in the background and reports the outcome through
    /// `completion`. The change set is delivered to listeners on the thread
    /// running the commit: tokio's blocking pool when called inside a
    /// runtime, a dedicated thread otherwise.
    pub fn async_commit<F>(
        &self,
        completion: F,
    ) where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let graph = self.clone();
        let task = move || completion(graph.commit());
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(task);
            }
            Err(_) => {
                debug!(graph = %self.inner.name, "no tokio runtime, committing on a new thread");
                std::thread::spawn(task);
            }
        }
    }

    /// [`Graph::commit`] on tokio's blocking pool.
    pub async fn commit_async(&self) -> Result<()> {
        let graph = self.clone();
        tokio::task::spawn_blocking(move || graph.commit()).await?
    }

    /// Announces records a synchronization layer already wrote to the store.
    ///
    /// Identifiers that no longer resolve are skipped; nothing is reported
    /// back to the caller.
    pub fn merge_remote(
        &self,
        merge: &RemoteMerge,
    ) {
        if merge.is_empty() {
            return;
        }
        let delivery = self.inner.commit_lock.lock();

        let changes = resolve_remote(self, merge);
        debug!(
            graph = %self.inner.name,
            announced = merge.inserted.len() + merge.updated.len() + merge.deleted.len(),
            resolved = changes.len(),
            "remote merge resolved"
        );
        if !changes.is_empty() {
            self.deliver(&delivery, &changes, Source::Remote);
        }
    }

    /// Drops every deletion snapshot, delivered or not. Only needed with
    /// `keep_tombstones`; otherwise snapshots go once their deletion has
    /// been delivered.
    pub fn purge_tombstones(&self) -> Result<usize> {
        let _serial = self.inner.commit_lock.lock();
        let count = self.inner.storage.purge_tombstones()?;
        debug!(graph = %self.inner.name, count, "tombstones purged");
        Ok(count)
    }

    pub(crate) fn attach(
        &self,
        source: Source,
        listener: std::sync::Weak<dyn ChangeListener>,
    ) -> ListenerKey {
        self.inner.channels.attach(source, listener)
    }

    pub(crate) fn detach(
        &self,
        key: ListenerKey,
    ) -> bool {
        self.inner.channels.detach(key)
    }

    pub fn listener_count(
        &self,
        source: Source,
    ) -> usize {
        self.inner.channels.len(source)
    }

    /// Hands `changes` to every live listener of `source`.
    ///
    /// A listener may commit again from inside its callback. Snapshots of the
    /// deleted records are only discarded once the outermost delivery is
    /// over, so listeners later in the loop can still resolve deleted owners.
    fn deliver(
        &self,
        delivery: &RefCell<Delivery>,
        changes: &ChangeSet,
        source: Source,
    ) {
        delivery.borrow_mut().depth += 1;
        for listener in self.inner.channels.live(source) {
            listener.on_change(self, changes, source);
        }

        let settled = {
            let mut delivery = delivery.borrow_mut();
            delivery.depth -= 1;
            delivery.delivered.extend(changes.deleted.iter().map(Record::id));
            if delivery.depth == 0 {
                Some(mem::take(&mut delivery.delivered))
            } else {
                None
            }
        };
        if let Some(ids) = settled {
            self.settle_tombstones(&ids);
        }
    }

    fn settle_tombstones(
        &self,
        ids: &[RecordId],
    ) {
        if self.inner.config.keep_tombstones || ids.is_empty() {
            return;
        }
        match self.inner.storage.discard_tombstones(ids) {
            Ok(count) => debug!(graph = %self.inner.name, count, "delivered tombstones discarded"),
            Err(e) => warn!(graph = %self.inner.name, "discard tombstones failed: {:?}", e),
        }
    }
}

/// Exclusive view over the pending transaction, see [`Graph::stage`]
pub(crate) struct Staging<'a> {
    txn: &'a mut Transaction,
    storage: &'a dyn GraphStorage,
}

impl Staging<'_> {
    pub(crate) fn read(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>> {
        read_through(self.txn, self.storage, id)
    }

    pub(crate) fn children(
        &self,
        node: RecordId,
    ) -> Result<Vec<Record>> {
        children_through(self.txn, self.storage, node)
    }

    pub(crate) fn insert(
        &mut self,
        record: Record,
    ) {
        self.txn.insert(record);
    }

    pub(crate) fn update(
        &mut self,
        record: Record,
    ) {
        self.txn.update(record);
    }

    pub(crate) fn delete(
        &mut self,
        snapshot: Record,
    ) {
        self.txn.delete(snapshot);
    }
}

fn read_through(
    txn: &Transaction,
    storage: &dyn GraphStorage,
    id: RecordId,
) -> Result<Option<Record>> {
    match txn.lookup(id) {
        Some(Overlay::Present(record)) => Ok(Some(record.clone())),
        Some(Overlay::Deleted) => Ok(None),
        None => storage.get(id),
    }
}

fn children_through(
    txn: &Transaction,
    storage: &dyn GraphStorage,
    node: RecordId,
) -> Result<Vec<Record>> {
    let mut children = Vec::new();
    for child in storage.children(node)? {
        match txn.lookup(child.id()) {
            Some(Overlay::Present(record)) => children.push(record.clone()),
            Some(Overlay::Deleted) => {}
            None => children.push(child),
        }
    }
    children.extend(txn.inserted_children(node).into_iter().cloned());
    Ok(children)
}
