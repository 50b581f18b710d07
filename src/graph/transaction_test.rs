use super::Overlay;
use super::Transaction;
use crate::NodeClass;
use crate::NodeRecord;
use crate::PropertyRecord;
use crate::Record;
use crate::RecordId;
use crate::TagRecord;
use crate::Value;

fn node(id: u64) -> Record {
    Record::Node(NodeRecord {
        id: RecordId(id),
        class: NodeClass::Entity,
        node_type: "T".to_string(),
        created_at: 0,
    })
}

fn property(
    id: u64,
    value: &str,
) -> Record {
    Record::Property(PropertyRecord {
        id: RecordId(id),
        node: RecordId(1),
        name: "P".to_string(),
        value: Value::from(value),
    })
}

fn tag(id: u64) -> Record {
    Record::Tag(TagRecord {
        id: RecordId(id),
        node: RecordId(1),
        name: "G".to_string(),
    })
}

#[test]
fn test_change_set_keeps_staging_order() {
    let mut txn = Transaction::default();
    txn.insert(node(1));
    txn.insert(tag(3));
    txn.insert(property(2, "V"));

    let changes = txn.to_change_set();
    let ids: Vec<u64> = changes.inserted.iter().map(|r| r.id().0).collect();
    assert_eq!(ids, vec![1, 3, 2]);
    assert!(changes.updated.is_empty());
}

#[test]
fn test_update_of_pending_insert_stays_insert() {
    let mut txn = Transaction::default();
    txn.insert(property(2, "V"));
    txn.update(property(2, "W"));

    let changes = txn.to_change_set();
    assert_eq!(changes.inserted, vec![property(2, "W")]);
    assert!(changes.updated.is_empty());
}

#[test]
fn test_delete_of_pending_insert_cancels_it() {
    let mut txn = Transaction::default();
    txn.insert(tag(3));
    txn.delete(tag(3));

    assert!(txn.is_empty());
    assert!(txn.to_change_set().is_empty());
}

#[test]
fn test_delete_after_update_keeps_latest_body() {
    let mut txn = Transaction::default();
    txn.update(property(2, "W"));
    txn.delete(property(2, "W"));

    let changes = txn.to_change_set();
    assert!(changes.updated.is_empty());
    assert_eq!(changes.deleted, vec![property(2, "W")]);
    assert_eq!(txn.lookup(RecordId(2)), Some(Overlay::Deleted));
}

#[test]
fn test_inserted_children_only_lists_owned_inserts() {
    let mut txn = Transaction::default();
    txn.insert(node(1));
    txn.insert(tag(3));
    txn.update(property(2, "V"));

    let children = txn.inserted_children(RecordId(1));
    assert_eq!(children, vec![&tag(3)]);
}

#[test]
fn test_absorb_puts_failed_changes_under_newer_ones() {
    let mut txn = Transaction::default();
    txn.insert(node(1));
    txn.insert(property(2, "V"));
    let failed = txn.take();
    assert!(txn.is_empty());

    // staged while the failed commit was in flight
    txn.update(property(2, "W"));
    txn.insert(tag(3));
    txn.absorb(failed);

    let changes = txn.to_change_set();
    assert_eq!(changes.inserted, vec![node(1), property(2, "W"), tag(3)]);
    assert!(changes.updated.is_empty());
}
