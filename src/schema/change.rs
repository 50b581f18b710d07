use super::Record;
use super::RecordId;

/// Materialized records touched by one commit, in the order they were staged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub inserted: Vec<Record>,
    pub updated: Vec<Record>,
    /// Pre-deletion snapshots
    pub deleted: Vec<Record>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inserted.len() + self.updated.len() + self.deleted.len()
    }

    /// Identifier-only view, the shape a remote merge arrives in.
    pub fn to_remote_merge(&self) -> RemoteMerge {
        RemoteMerge {
            inserted: self.inserted.iter().map(Record::id).collect(),
            updated: self.updated.iter().map(Record::id).collect(),
            deleted: self.deleted.iter().map(Record::id).collect(),
        }
    }
}

/// Change notification from a synchronization layer. Records were already
/// written to the local store; only their identifiers travel with the notice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMerge {
    pub inserted: Vec<RecordId>,
    pub updated: Vec<RecordId>,
    pub deleted: Vec<RecordId>,
}

impl RemoteMerge {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}
