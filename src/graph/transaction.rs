//! Pending changes of a graph that have not been committed yet.
//!
//! Every staged record sits in one slot keyed by its id, so the overlay a
//! reader sees is always the latest intent:
//! - an update of a pending insert stays an insert, with the newer body
//! - a delete of a pending insert cancels it, nothing reaches the store
//! - a delete of a committed record carries its last visible body

use std::collections::HashMap;

use tracing::trace;

use crate::ChangeSet;
use crate::Record;
use crate::RecordId;

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Inserted(Record),
    Updated(Record),
    Deleted(Record),
}

#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    stage: Stage,
}

/// What the pending transaction knows about one record
#[derive(Debug, PartialEq)]
pub(crate) enum Overlay<'a> {
    Present(&'a Record),
    Deleted,
}

#[derive(Debug, Default)]
pub(crate) struct Transaction {
    slots: HashMap<RecordId, Slot>,
    next_seq: u64,
}

impl Transaction {
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(crate) fn insert(
        &mut self,
        record: Record,
    ) {
        let seq = self.bump();
        self.slots.insert(
            record.id(),
            Slot {
                seq,
                stage: Stage::Inserted(record),
            },
        );
    }

    pub(crate) fn update(
        &mut self,
        record: Record,
    ) {
        let id = record.id();
        match self.slots.get_mut(&id) {
            Some(slot) => match &mut slot.stage {
                Stage::Inserted(body) | Stage::Updated(body) => *body = record,
                Stage::Deleted(_) => trace!(%id, "update of a record pending deletion ignored"),
            },
            None => {
                let seq = self.bump();
                self.slots.insert(
                    id,
                    Slot {
                        seq,
                        stage: Stage::Updated(record),
                    },
                );
            }
        }
    }

    pub(crate) fn delete(
        &mut self,
        snapshot: Record,
    ) {
        let id = snapshot.id();
        match self.slots.get(&id).map(|slot| &slot.stage) {
            Some(Stage::Inserted(_)) => {
                self.slots.remove(&id);
            }
            Some(Stage::Deleted(_)) => {}
            Some(Stage::Updated(_)) | None => {
                let seq = self.bump();
                self.slots.insert(
                    id,
                    Slot {
                        seq,
                        stage: Stage::Deleted(snapshot),
                    },
                );
            }
        }
    }

    pub(crate) fn lookup(
        &self,
        id: RecordId,
    ) -> Option<Overlay<'_>> {
        self.slots.get(&id).map(|slot| match &slot.stage {
            Stage::Inserted(r) | Stage::Updated(r) => Overlay::Present(r),
            Stage::Deleted(_) => Overlay::Deleted,
        })
    }

    /// Pending inserts owned by `node`, in staging order
    pub(crate) fn inserted_children(
        &self,
        node: RecordId,
    ) -> Vec<&Record> {
        let mut found: Vec<(u64, &Record)> = self
            .slots
            .values()
            .filter_map(|slot| match &slot.stage {
                Stage::Inserted(r) if r.owner() == Some(node) => Some((slot.seq, r)),
                _ => None,
            })
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, r)| r).collect()
    }

    /// Empties the transaction. Sequence numbers keep counting so a later
    /// [`Transaction::absorb`] can still order old and new entries.
    pub(crate) fn take(&mut self) -> Transaction {
        let next_seq = self.next_seq;
        let taken = std::mem::take(self);
        self.next_seq = next_seq;
        taken
    }

    pub(crate) fn to_change_set(&self) -> ChangeSet {
        let mut slots: Vec<&Slot> = self.slots.values().collect();
        slots.sort_by_key(|slot| slot.seq);

        let mut changes = ChangeSet::default();
        for slot in slots {
            match &slot.stage {
                Stage::Inserted(r) => changes.inserted.push(r.clone()),
                Stage::Updated(r) => changes.updated.push(r.clone()),
                Stage::Deleted(r) => changes.deleted.push(r.clone()),
            }
        }
        changes
    }

    /// Puts the changes of a failed commit back underneath anything staged
    /// since. A newer stage of the same record wins, except that an update
    /// on top of a failed insert stays an insert.
    pub(crate) fn absorb(
        &mut self,
        failed: Transaction,
    ) {
        for (id, older) in failed.slots {
            match self.slots.get_mut(&id) {
                None => {
                    self.slots.insert(id, older);
                }
                Some(newer) => {
                    let promoted = match (&older.stage, &newer.stage) {
                        (Stage::Inserted(_), Stage::Updated(body)) => Some(body.clone()),
                        _ => None,
                    };
                    if let Some(body) = promoted {
                        newer.stage = Stage::Inserted(body);
                        newer.seq = older.seq;
                    }
                }
            }
        }
    }
}
