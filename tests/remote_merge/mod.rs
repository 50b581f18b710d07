use watchgraph::ChangeSet;
use watchgraph::Entity;
use watchgraph::GroupRecord;
use watchgraph::NodeClass;
use watchgraph::NodeRecord;
use watchgraph::Record;
use watchgraph::RecordId;
use watchgraph::RemoteMerge;
use watchgraph::Source;

use crate::common::names;
use crate::common::temporary_graph;
use crate::common::watch_everything;
use crate::enable_logger;

fn remote_entity(
    graph: &watchgraph::Graph,
    group: &str,
) -> (Record, Record) {
    let node = Record::Node(NodeRecord {
        id: graph.next_id().unwrap(),
        class: NodeClass::Entity,
        node_type: "T".to_string(),
        created_at: 0,
    });
    let group = Record::Group(GroupRecord {
        id: graph.next_id().unwrap(),
        node: node.id(),
        name: group.to_string(),
    });
    (node, group)
}

#[test]
fn test_remote_inserts_are_tagged_remote() {
    enable_logger();
    let graph = temporary_graph("it-remote-insert");
    let mut observed = watch_everything(&graph);

    let (node, group) = remote_entity(&graph, "Admins");
    let written = ChangeSet {
        inserted: vec![node.clone(), group],
        ..Default::default()
    };
    graph.storage().apply(&written).unwrap();
    graph.merge_remote(&written.to_remote_merge());

    let events = observed.drain();
    assert_eq!(names(&events), vec!["inserted", "added_to_group"]);
    assert!(events.iter().all(|e| e.source() == Source::Remote));
    assert_eq!(events[0].entity().id(), node.id());

    // the merged entity is an ordinary entity from here on
    let entity = Entity::load(&graph, node.id()).unwrap().unwrap();
    assert!(entity.is_member_of(&["Admins"]).unwrap());
}

/// # Case: an announced id was deleted locally before the merge arrived
#[test]
fn test_merge_of_locally_deleted_record_is_silent() {
    let graph = temporary_graph("it-remote-miss");
    let mut observed = watch_everything(&graph);

    let entity = Entity::new_in("T", &graph).unwrap();
    graph.commit().unwrap();
    entity.delete().unwrap();
    graph.commit().unwrap();
    observed.drain();

    graph.merge_remote(&RemoteMerge {
        inserted: vec![entity.id()],
        ..Default::default()
    });
    graph.merge_remote(&RemoteMerge {
        updated: vec![RecordId(u64::MAX)],
        ..Default::default()
    });

    assert!(observed.drain().is_empty());
}

#[test]
fn test_remote_deletion_recovers_owner() {
    let graph = temporary_graph("it-remote-delete");
    let mut observed = watch_everything(&graph);

    let (node, group) = remote_entity(&graph, "Staff");
    let written = ChangeSet {
        inserted: vec![node.clone(), group.clone()],
        ..Default::default()
    };
    graph.storage().apply(&written).unwrap();
    graph.merge_remote(&written.to_remote_merge());
    observed.drain();

    let removed = ChangeSet {
        deleted: vec![group, node.clone()],
        ..Default::default()
    };
    graph.storage().apply(&removed).unwrap();
    graph.merge_remote(&removed.to_remote_merge());

    let events = observed.drain();
    assert_eq!(names(&events), vec!["removed_from_group", "deleted"]);
    assert!(events.iter().all(|e| e.entity().id() == node.id()));
}
