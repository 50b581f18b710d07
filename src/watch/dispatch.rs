//! Event dispatch
//!
//! Matched records are replayed as delegate callbacks in a fixed order:
//! - inserted: nodes first, then tags, groups and properties, so a new
//!   entity is announced before anything attached to it
//! - updated: properties only
//! - deleted: tags, groups and properties first, the node itself last

use tracing::trace;
use tracing::warn;

use super::filter_records;
use super::WatchDelegate;
use super::WatchShared;
use super::WatchStatus;
use super::Watchable;
use crate::metrics::WATCH_DISPATCH_FAULTS_METRIC;
use crate::metrics::WATCH_EVENTS_METRIC;
use crate::ChangeListener;
use crate::ChangeSet;
use crate::Graph;
use crate::NodeRecord;
use crate::Record;
use crate::RecordKind;
use crate::Source;
use crate::WatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Inserted,
    Updated,
    Deleted,
}

struct Batch<'r> {
    inserted: Vec<&'r Record>,
    updated: Vec<&'r Record>,
    deleted: Vec<&'r Record>,
}

impl Batch<'_> {
    fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

impl<T: Watchable> ChangeListener for WatchShared<T> {
    fn on_change(
        &self,
        graph: &Graph,
        changes: &ChangeSet,
        source: Source,
    ) {
        if self.current_status() != WatchStatus::Running {
            trace!(watch = %self.id, "watch not running, change set skipped");
            return;
        }

        let batch = {
            let filters = self.filters.read();
            let Some(predicate) = filters.compound() else {
                trace!(watch = %self.id, "watch has no criteria, change set skipped");
                return;
            };
            Batch {
                inserted: filter_records(graph, self.id, predicate, &changes.inserted),
                updated: filter_records(graph, self.id, predicate, &changes.updated),
                deleted: filter_records(graph, self.id, predicate, &changes.deleted),
            }
        };
        if batch.is_empty() {
            return;
        }

        Dispatcher {
            shared: self,
            graph,
            source,
        }
        .run(&batch);
    }
}

struct Dispatcher<'a, T: Watchable> {
    shared: &'a WatchShared<T>,
    graph: &'a Graph,
    source: Source,
}

impl<T: Watchable> Dispatcher<'_, T> {
    fn run(
        &self,
        batch: &Batch<'_>,
    ) {
        let facets = [RecordKind::Tag, RecordKind::Group, RecordKind::Property];

        for node in batch.inserted.iter().filter_map(|r| r.as_node()) {
            self.node_event(node, Phase::Inserted);
        }
        for kind in facets {
            for record in batch.inserted.iter().filter(|r| r.kind() == kind) {
                self.facet_event(record, Phase::Inserted);
            }
        }

        for record in batch.updated.iter().filter(|r| r.kind() == RecordKind::Property) {
            self.facet_event(record, Phase::Updated);
        }

        for kind in facets {
            for record in batch.deleted.iter().filter(|r| r.kind() == kind) {
                self.facet_event(record, Phase::Deleted);
            }
        }
        for node in batch.deleted.iter().filter_map(|r| r.as_node()) {
            self.node_event(node, Phase::Deleted);
        }
    }

    fn node_event(
        &self,
        node: &NodeRecord,
        phase: Phase,
    ) {
        if node.class != T::CLASS {
            return;
        }
        let entity = T::from_node(self.graph, node.clone());
        match phase {
            Phase::Inserted => self.emit("inserted", |d| d.inserted(self.graph, &entity, self.source)),
            Phase::Deleted => self.emit("deleted", |d| d.deleted(self.graph, &entity, self.source)),
            Phase::Updated => {}
        }
    }

    fn facet_event(
        &self,
        record: &Record,
        phase: Phase,
    ) {
        let Some(node) = self.owner(record, phase) else {
            return;
        };
        if node.class != T::CLASS {
            return;
        }
        let entity = T::from_node(self.graph, node);
        let (graph, source) = (self.graph, self.source);

        match (record, phase) {
            (Record::Tag(tag), Phase::Inserted) => {
                self.emit("added_tag", |d| d.added_tag(graph, &entity, &tag.name, source))
            }
            (Record::Tag(tag), Phase::Deleted) => {
                self.emit("removed_tag", |d| d.removed_tag(graph, &entity, &tag.name, source))
            }
            (Record::Group(group), Phase::Inserted) => self.emit("added_to_group", |d| {
                d.added_to_group(graph, &entity, &group.name, source)
            }),
            (Record::Group(group), Phase::Deleted) => self.emit("removed_from_group", |d| {
                d.removed_from_group(graph, &entity, &group.name, source)
            }),
            (Record::Property(p), Phase::Inserted) => self.emit("added_property", |d| {
                d.added_property(graph, &entity, &p.name, &p.value, source)
            }),
            (Record::Property(p), Phase::Updated) => self.emit("updated_property", |d| {
                d.updated_property(graph, &entity, &p.name, &p.value, source)
            }),
            (Record::Property(p), Phase::Deleted) => self.emit("removed_property", |d| {
                d.removed_property(graph, &entity, &p.name, &p.value, source)
            }),
            _ => {}
        }
    }

    /// Owning node of a facet record. Records of a deleted node still name
    /// it; the node itself is then only found among the deletion snapshots.
    fn owner(
        &self,
        record: &Record,
        phase: Phase,
    ) -> Option<NodeRecord> {
        let owner = record.owner()?;
        let live = self.graph.node(owner);
        let resolved = match (live, phase) {
            (Ok(None), Phase::Deleted) => self
                .graph
                .storage()
                .tombstone(owner)
                .map(|snapshot| snapshot.and_then(|r| r.as_node().cloned())),
            (live, _) => live,
        };

        match resolved {
            Ok(Some(node)) => Some(node),
            Ok(None) => {
                trace!(watch = %self.shared.id, record = %record.id(), %owner, "owner not found, event skipped");
                None
            }
            Err(e) => {
                let fault = WatchError::DispatchFault {
                    record: record.id(),
                    reason: e.to_string(),
                };
                warn!(watch = %self.shared.id, "{}", fault);
                WATCH_DISPATCH_FAULTS_METRIC
                    .with_label_values(&[self.graph.name()])
                    .inc();
                None
            }
        }
    }

    fn emit(
        &self,
        event: &'static str,
        call: impl FnOnce(&dyn WatchDelegate<T>),
    ) {
        if self.shared.current_status() == WatchStatus::Detached {
            return;
        }
        let Some(delegate) = self.shared.delegate() else {
            trace!(watch = %self.shared.id, event, "no delegate, event discarded");
            return;
        };
        call(delegate.as_ref());
        if self.graph.watch_config().enable_metrics {
            WATCH_EVENTS_METRIC
                .with_label_values(&[event, self.source.as_str()])
                .inc();
        }
    }
}
