use super::*;
use crate::test_utils;
use crate::ChangeSet;
use crate::GraphConfig;
use crate::GraphStorage;
use crate::GroupRecord;
use crate::NodeClass;
use crate::NodeRecord;
use crate::PropertyRecord;
use crate::Record;
use crate::RecordId;
use crate::StorageConfig;
use crate::TagRecord;
use crate::Value;

fn temporary_storage() -> SledGraphStorage {
    SledGraphStorage::open("storage-test", &GraphConfig::temporary("storage-test").storage)
        .expect("should open temporary storage")
}

fn node(id: u64) -> Record {
    Record::Node(NodeRecord {
        id: RecordId(id),
        class: NodeClass::Entity,
        node_type: "T".to_string(),
        created_at: 1,
    })
}

fn tag(
    id: u64,
    node: u64,
) -> Record {
    Record::Tag(TagRecord {
        id: RecordId(id),
        node: RecordId(node),
        name: "G".to_string(),
    })
}

fn property(
    id: u64,
    node: u64,
    value: &str,
) -> Record {
    Record::Property(PropertyRecord {
        id: RecordId(id),
        node: RecordId(node),
        name: "P".to_string(),
        value: Value::from(value),
    })
}

#[test]
fn test_generate_id_is_never_zero_and_increases() {
    let storage = temporary_storage();
    let first = storage.generate_id().unwrap();
    let second = storage.generate_id().unwrap();

    assert!(first.0 > 0);
    assert!(second > first);
}

#[test]
fn test_apply_inserts_records_and_child_index() {
    let storage = temporary_storage();
    let changes = ChangeSet {
        inserted: vec![node(1), tag(2, 1), property(3, 1, "V")],
        ..Default::default()
    };

    storage.apply(&changes).expect("should succeed");

    assert_eq!(storage.len(), 3);
    assert_eq!(storage.get(RecordId(1)).unwrap(), Some(node(1)));
    let children = storage.children(RecordId(1)).unwrap();
    assert_eq!(children.len(), 2);
    assert!(children.contains(&tag(2, 1)));
    assert!(children.contains(&property(3, 1, "V")));
}

#[test]
fn test_children_do_not_leak_across_nodes() {
    let storage = temporary_storage();
    let changes = ChangeSet {
        inserted: vec![node(1), node(256), tag(2, 1), tag(3, 256)],
        ..Default::default()
    };
    storage.apply(&changes).unwrap();

    assert_eq!(storage.children(RecordId(1)).unwrap(), vec![tag(2, 1)]);
    assert_eq!(storage.children(RecordId(256)).unwrap(), vec![tag(3, 256)]);
}

#[test]
fn test_apply_update_replaces_value() {
    let storage = temporary_storage();
    storage
        .apply(&ChangeSet {
            inserted: vec![node(1), property(2, 1, "V")],
            ..Default::default()
        })
        .unwrap();

    storage
        .apply(&ChangeSet {
            updated: vec![property(2, 1, "W")],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(storage.get(RecordId(2)).unwrap(), Some(property(2, 1, "W")));
    assert_eq!(storage.children(RecordId(1)).unwrap().len(), 1);
}

#[test]
fn test_apply_delete_moves_record_to_tombstones() {
    let storage = temporary_storage();
    storage
        .apply(&ChangeSet {
            inserted: vec![node(1), tag(2, 1)],
            ..Default::default()
        })
        .unwrap();

    storage
        .apply(&ChangeSet {
            deleted: vec![tag(2, 1), node(1)],
            ..Default::default()
        })
        .unwrap();

    assert!(storage.is_empty());
    assert_eq!(storage.get(RecordId(2)).unwrap(), None);
    assert!(storage.children(RecordId(1)).unwrap().is_empty());
    // the snapshot still names its owner
    assert_eq!(storage.tombstone(RecordId(2)).unwrap(), Some(tag(2, 1)));
    assert_eq!(storage.tombstone(RecordId(1)).unwrap(), Some(node(1)));
}

#[test]
fn test_purge_tombstones() {
    let storage = temporary_storage();
    storage
        .apply(&ChangeSet {
            inserted: vec![node(1), node(2)],
            ..Default::default()
        })
        .unwrap();
    storage
        .apply(&ChangeSet {
            deleted: vec![node(1), node(2)],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(storage.tombstone_count(), 2);
    assert_eq!(storage.purge_tombstones().unwrap(), 2);
    assert_eq!(storage.tombstone(RecordId(1)).unwrap(), None);
    assert_eq!(storage.tombstone_count(), 0);
}

#[test]
fn test_discard_tombstones_only_drops_named_snapshots() {
    let storage = temporary_storage();
    storage
        .apply(&ChangeSet {
            inserted: vec![node(1), node(2)],
            ..Default::default()
        })
        .unwrap();
    storage
        .apply(&ChangeSet {
            deleted: vec![node(1), node(2)],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(
        storage
            .discard_tombstones(&[RecordId(1), RecordId(77)])
            .expect("should succeed"),
        1
    );
    assert_eq!(storage.tombstone(RecordId(1)).unwrap(), None);
    assert_eq!(storage.tombstone(RecordId(2)).unwrap(), Some(node(2)));
    assert_eq!(storage.tombstone_count(), 1);
}

#[test]
fn test_group_records_are_indexed_like_tags() {
    let storage = temporary_storage();
    let group = Record::Group(GroupRecord {
        id: RecordId(5),
        node: RecordId(1),
        name: "Admins".to_string(),
    });
    storage
        .apply(&ChangeSet {
            inserted: vec![node(1), group.clone()],
            ..Default::default()
        })
        .unwrap();

    assert_eq!(storage.children(RecordId(1)).unwrap(), vec![group]);
}

/// # Case: records survive a reopen of a persistent store
#[test]
fn test_records_survive_reopen() {
    test_utils::enable_logger();

    let dir = tempfile::tempdir().unwrap();
    let mut config = StorageConfig::default();
    config.db_root_dir = dir.path().to_path_buf();
    config.flush_every_ms = None;

    {
        let storage = SledGraphStorage::open("reopen", &config).unwrap();
        storage
            .apply(&ChangeSet {
                inserted: vec![node(1), tag(2, 1)],
                ..Default::default()
            })
            .unwrap();
        storage.flush().expect("should succeed");
    }

    {
        let storage = SledGraphStorage::open("reopen", &config).unwrap();
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.children(RecordId(1)).unwrap(), vec![tag(2, 1)]);
    }
}
