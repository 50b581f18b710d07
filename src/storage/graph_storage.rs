//! GraphStorage
//!
//! The durable transactional store underneath a graph. The watch subsystem only
//! relies on this surface:
//! - atomic application of a [`ChangeSet`]
//! - point lookups of live records and of deletion snapshots
//! - the node to facet-record relationship

#[cfg(test)]
use mockall::automock;

use crate::ChangeSet;
use crate::Record;
use crate::RecordId;
use crate::Result;

#[cfg_attr(test, automock)]
pub trait GraphStorage: Send + Sync + 'static {
    /// Allocate a fresh record identifier
    fn generate_id(&self) -> Result<RecordId>;

    /// Live record lookup
    fn get(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>>;

    /// Snapshot a record had right before it was deleted
    fn tombstone(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>>;

    /// Property, tag and group records currently owned by `node`
    fn children(
        &self,
        node: RecordId,
    ) -> Result<Vec<Record>>;

    /// Apply inserts, updates and deletes as one atomic write.
    /// Deleted records are moved to the tombstone set.
    fn apply(
        &self,
        changes: &ChangeSet,
    ) -> Result<()>;

    /// Drop the deletion snapshots of `ids`, returning how many existed
    fn discard_tombstones(
        &self,
        ids: &[RecordId],
    ) -> Result<usize>;

    /// Drop every deletion snapshot, returning how many were dropped
    fn purge_tombstones(&self) -> Result<usize>;

    /// Number of deletion snapshots retained
    fn tombstone_count(&self) -> usize;

    fn flush(&self) -> Result<()>;

    /// Number of live records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
