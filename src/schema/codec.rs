//! On-disk record layout: one kind byte followed by the bincode body of the
//! kind-specific struct.

use tracing::debug;

use super::GroupRecord;
use super::NodeRecord;
use super::PropertyRecord;
use super::Record;
use super::RecordKind;
use super::TagRecord;
use crate::StorageError;

pub(crate) fn encode_record(record: &Record) -> std::result::Result<Vec<u8>, StorageError> {
    let mut buffer = vec![record.kind().code()];
    let body = match record {
        Record::Node(r) => bincode::serialize(r)?,
        Record::Property(r) => bincode::serialize(r)?,
        Record::Tag(r) => bincode::serialize(r)?,
        Record::Group(r) => bincode::serialize(r)?,
    };
    buffer.extend_from_slice(&body);
    Ok(buffer)
}

/// Returns `Ok(None)` for kinds this build does not know about.
pub(crate) fn decode_record(bytes: &[u8]) -> std::result::Result<Option<Record>, StorageError> {
    let (code, body) = match bytes.split_first() {
        Some(split) => split,
        None => {
            return Err(StorageError::DataCorruption {
                location: "empty record value".to_string(),
            })
        }
    };

    let kind = match RecordKind::from_code(*code) {
        Some(kind) => kind,
        None => {
            debug!(code, "skipping record of unrecognized kind");
            return Ok(None);
        }
    };

    let record = match kind {
        RecordKind::Node => Record::Node(bincode::deserialize::<NodeRecord>(body)?),
        RecordKind::Property => Record::Property(bincode::deserialize::<PropertyRecord>(body)?),
        RecordKind::Tag => Record::Tag(bincode::deserialize::<TagRecord>(body)?),
        RecordKind::Group => Record::Group(bincode::deserialize::<GroupRecord>(body)?),
    };
    Ok(Some(record))
}
