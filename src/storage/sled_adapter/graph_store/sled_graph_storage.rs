//! Sled-backed graph storage.
//!
//! Three trees:
//! - `_records`: record id -> encoded record
//! - `_children`: owning node id ++ child id -> empty, the node to facet index
//! - `_tombstones`: record id -> encoded pre-deletion snapshot

use sled::transaction::TransactionResult;
use sled::Transactional;
use tracing::debug;
use tracing::error;
use tracing::warn;

use crate::constants::CHILDREN_TREE;
use crate::constants::RECORDS_TREE;
use crate::constants::TOMBSTONES_TREE;
use crate::init_sled_graph_db;
use crate::schema::decode_record;
use crate::schema::encode_record;
use crate::ChangeSet;
use crate::GraphStorage;
use crate::Record;
use crate::RecordId;
use crate::Result;
use crate::StorageConfig;
use crate::StorageError;

pub struct SledGraphStorage {
    db: sled::Db,
    records: sled::Tree,
    children: sled::Tree,
    tombstones: sled::Tree,
}

impl std::fmt::Debug for SledGraphStorage {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledGraphStorage")
            .field("records", &self.records.len())
            .field("tombstones", &self.tombstones.len())
            .finish()
    }
}

/// Pre-encoded write, built outside the transaction closure since sled may
/// run the closure more than once.
struct StagedWrite {
    key: [u8; 8],
    value: Vec<u8>,
    child_key: Option<[u8; 16]>,
}

fn child_key(
    node: RecordId,
    child: RecordId,
) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&node.to_be_bytes());
    key[8..].copy_from_slice(&child.to_be_bytes());
    key
}

fn stage(records: &[Record]) -> std::result::Result<Vec<StagedWrite>, StorageError> {
    records
        .iter()
        .map(|record| -> std::result::Result<StagedWrite, StorageError> {
            Ok(StagedWrite {
                key: record.id().to_be_bytes(),
                value: encode_record(record)?,
                child_key: record.owner().map(|owner| child_key(owner, record.id())),
            })
        })
        .collect()
}

impl SledGraphStorage {
    pub fn new(db: sled::Db) -> Result<Self> {
        let records = db.open_tree(RECORDS_TREE)?;
        let children = db.open_tree(CHILDREN_TREE)?;
        let tombstones = db.open_tree(TOMBSTONES_TREE)?;
        Ok(Self {
            db,
            records,
            children,
            tombstones,
        })
    }

    pub fn open(
        name: &str,
        config: &StorageConfig,
    ) -> Result<Self> {
        let db = init_sled_graph_db(name, config).map_err(StorageError::IoError)?;
        Self::new(db)
    }

    fn read(
        tree: &sled::Tree,
        id: RecordId,
    ) -> Result<Option<Record>> {
        match tree.get(id.to_be_bytes())? {
            Some(bytes) => Ok(decode_record(&bytes)?),
            None => Ok(None),
        }
    }
}

impl GraphStorage for SledGraphStorage {
    fn generate_id(&self) -> Result<RecordId> {
        // sled starts counting at 0; keep 0 free as a sentinel
        Ok(RecordId(self.db.generate_id()? + 1))
    }

    fn get(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>> {
        Self::read(&self.records, id)
    }

    fn tombstone(
        &self,
        id: RecordId,
    ) -> Result<Option<Record>> {
        Self::read(&self.tombstones, id)
    }

    fn children(
        &self,
        node: RecordId,
    ) -> Result<Vec<Record>> {
        let mut found = Vec::new();
        for item in self.children.scan_prefix(node.to_be_bytes()) {
            let (key, _) = item?;
            if key.len() != 16 {
                return Err(StorageError::DataCorruption {
                    location: format!("{CHILDREN_TREE} key of length {}", key.len()),
                }
                .into());
            }
            let child = RecordId::from_be_slice(&key[8..])?;
            match Self::read(&self.records, child)? {
                Some(record) => found.push(record),
                None => warn!(%node, %child, "child index points at a missing record"),
            }
        }
        Ok(found)
    }

    fn apply(
        &self,
        changes: &ChangeSet,
    ) -> Result<()> {
        let mut upserts = stage(&changes.inserted)?;
        upserts.extend(stage(&changes.updated)?);
        let deletes = stage(&changes.deleted)?;
        let empty: &[u8] = &[];

        let result: TransactionResult<()> = (&self.records, &self.children, &self.tombstones).transaction(
            |(records, children, tombstones)| {
                for write in &upserts {
                    records.insert(&write.key[..], write.value.as_slice())?;
                    if let Some(child_key) = &write.child_key {
                        children.insert(&child_key[..], empty)?;
                    }
                }
                for write in &deletes {
                    records.remove(&write.key[..])?;
                    if let Some(child_key) = &write.child_key {
                        children.remove(&child_key[..])?;
                    }
                    tombstones.insert(&write.key[..], write.value.as_slice())?;
                }
                Ok(())
            },
        );

        match result {
            Ok(()) => {
                debug!(
                    upserts = upserts.len(),
                    deletes = deletes.len(),
                    "change set applied"
                );
                Ok(())
            }
            Err(e) => {
                error!("apply change set failed: {:?}", e);
                Err(StorageError::DbError(format!("{e:?}")).into())
            }
        }
    }

    fn discard_tombstones(
        &self,
        ids: &[RecordId],
    ) -> Result<usize> {
        let mut count = 0;
        for id in ids {
            if self.tombstones.remove(id.to_be_bytes())?.is_some() {
                count += 1;
            }
        }
        debug!(requested = ids.len(), count, "tombstones discarded");
        Ok(count)
    }

    fn purge_tombstones(&self) -> Result<usize> {
        let count = self.tombstones.len();
        self.tombstones.clear()?;
        debug!(count, "tombstones purged");
        Ok(count)
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.db.flush()?;
        debug!("Successfully flushed graph storage, bytes flushed: {}", bytes);
        Ok(())
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }
}
