//! Change intake: turning what a graph announces into the records a watch
//! dispatches.

use tracing::debug;
use tracing::warn;

use super::Predicate;
use super::WatchId;
use crate::metrics::WATCH_DISPATCH_FAULTS_METRIC;
use crate::metrics::WATCH_RESOLUTION_MISSES_METRIC;
use crate::ChangeSet;
use crate::Graph;
use crate::Record;
use crate::RecordId;
use crate::RemoteMerge;
use crate::Result;
use crate::WatchError;

/// Materializes the identifiers of a remote merge. Inserted and updated ids
/// resolve to live records, deleted ids to their deletion snapshots. Ids
/// that resolve to nothing are dropped.
pub(crate) fn resolve_remote(
    graph: &Graph,
    merge: &RemoteMerge,
) -> ChangeSet {
    let storage = graph.storage();
    ChangeSet {
        inserted: resolve_each(graph, &merge.inserted, |id| storage.get(id)),
        updated: resolve_each(graph, &merge.updated, |id| storage.get(id)),
        deleted: resolve_each(graph, &merge.deleted, |id| storage.tombstone(id)),
    }
}

fn resolve_each(
    graph: &Graph,
    ids: &[RecordId],
    lookup: impl Fn(RecordId) -> Result<Option<Record>>,
) -> Vec<Record> {
    ids.iter()
        .filter_map(|id| match lookup(*id) {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                let miss = WatchError::ResolutionMiss(*id);
                debug!(graph = %graph.name(), "{}", miss);
                WATCH_RESOLUTION_MISSES_METRIC
                    .with_label_values(&[graph.name()])
                    .inc();
                None
            }
            Err(e) => {
                warn!(graph = %graph.name(), record = %id, "resolving remote record failed: {:?}", e);
                WATCH_DISPATCH_FAULTS_METRIC
                    .with_label_values(&[graph.name()])
                    .inc();
                None
            }
        })
        .collect()
}

/// Records of `records` that pass `predicate`. A record whose evaluation
/// faults is dropped on its own; the rest of the batch is unaffected.
pub(crate) fn filter_records<'r>(
    graph: &Graph,
    watch: WatchId,
    predicate: &Predicate,
    records: &'r [Record],
) -> Vec<&'r Record> {
    records
        .iter()
        .filter(|record| match predicate.evaluate(record) {
            Ok(matched) => matched,
            Err(e) => {
                warn!(%watch, record = %record.id(), "predicate evaluation failed: {}", e);
                WATCH_DISPATCH_FAULTS_METRIC
                    .with_label_values(&[graph.name()])
                    .inc();
                false
            }
        })
        .collect()
}
