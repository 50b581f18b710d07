//! Graph Store Error Hierarchy
//!
//! Errors are grouped by where they surface:
//! - input validation fails synchronously at the facade call site
//! - commit and durability failures come back from `Graph::commit` or through the async
//!   completion callback
//! - per-record watch faults are produced and absorbed inside change intake and never reach a
//!   delegate

use config::ConfigError;
use tokio::task::JoinError;

use crate::schema::RecordId;
use crate::schema::RecordKind;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied an empty type, tag, group or property name
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    /// The store refused to make the pending transaction durable
    #[error("Commit failed: {reason}")]
    CommitFailed { reason: String },

    /// Infrastructure-level failures (embedded database, codec, io)
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Watch intake failures. Only visible to code that drives intake directly.
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("Entity type must not be empty")]
    EmptyType,

    /// Empty tag, group or property name
    #[error("{facet} name must not be empty")]
    EmptyKey { facet: &'static str },

    /// Tags, groups and properties cannot be attached to a deleted entity
    #[error("Entity {id} has been deleted")]
    EntityDeleted { id: RecordId },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Serialization failures for persisted records
    #[error(transparent)]
    BincodeError(#[from] bincode::Error),

    /// Embedded database errors
    #[error("Embedded database error: {0}")]
    DbError(String),

    /// A stored key or value does not have the expected layout
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// A remote-merge identifier no longer resolves in the local store
    #[error("Record {0} could not be resolved")]
    ResolutionMiss(RecordId),

    /// A predicate asked a record for a field its kind does not carry
    #[error("Predicate key `{key}` is not defined on {kind} records")]
    PredicateFault { key: &'static str, kind: RecordKind },

    /// Reconstructing the typed event for one record failed
    #[error("Dispatch of record {record} failed: {reason}")]
    DispatchFault { record: RecordId, reason: String },
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        match e {
            sled::Error::Io(io) => StorageError::IoError(io),
            other => StorageError::DbError(other.to_string()),
        }
    }
}

impl From<sled::Error> for Error {
    fn from(e: sled::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Storage(e.into())
    }
}

impl From<JoinError> for Error {
    fn from(e: JoinError) -> Self {
        Error::Fatal(format!("Background commit task failed: {e}"))
    }
}

impl Error {
    /// Converts any failure raised while persisting a transaction into `CommitFailed`.
    pub(crate) fn into_commit_failure(self) -> Error {
        match self {
            Error::CommitFailed { .. } => self,
            other => Error::CommitFailed {
                reason: other.to_string(),
            },
        }
    }
}
