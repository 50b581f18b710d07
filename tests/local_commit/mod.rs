use watchgraph::Entity;
use watchgraph::EventForwarder;
use watchgraph::Source;
use watchgraph::Value;
use watchgraph::Watch;
use watchgraph::WatchEvent;

use crate::common::drain;
use crate::common::names;
use crate::common::temporary_graph;
use crate::common::watch_everything;
use crate::enable_logger;

/// # Case: create, narrow, commit, observe
///
/// An entity of type T with property P=V and tag G is announced as
/// `inserted`, `added_tag` and `added_property`, all local.
#[test]
fn test_end_to_end_local_events() {
    enable_logger();
    let graph = temporary_graph("it-end-to-end");
    let watch: Watch = Watch::new(&graph);
    watch.for_types(&["T"]).has_tags(&["G"]).where_properties(&["P"]);
    let (delegate, mut events) = EventForwarder::channel();
    watch.set_delegate(&delegate);

    let entity = Entity::new_in("T", &graph).unwrap();
    entity.set("P", "V").unwrap();
    entity.add_tags(&["G"]).unwrap();
    graph.commit().unwrap();

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            WatchEvent::Inserted {
                entity: entity.clone(),
                source: Source::Local,
            },
            WatchEvent::AddedTag {
                entity: entity.clone(),
                tag: "G".to_string(),
                source: Source::Local,
            },
            WatchEvent::AddedProperty {
                entity,
                property: "P".to_string(),
                value: Value::from("V"),
                source: Source::Local,
            },
        ]
    );
}

#[test]
fn test_adding_a_tag_twice_is_idempotent() {
    let graph = temporary_graph("it-idempotent-tag");
    let mut observed = watch_everything(&graph);

    let entity = Entity::new_in("T", &graph).unwrap();
    entity.add_tags(&["G"]).unwrap();
    entity.add_tags(&["G"]).unwrap();
    graph.commit().unwrap();
    entity.add_tags(&["G"]).unwrap();
    graph.commit().unwrap();

    assert_eq!(entity.tags().unwrap(), vec!["G"]);
    assert_eq!(names(&observed.drain()), vec!["inserted", "added_tag"]);
}

#[test]
fn test_reads_see_pending_writes() {
    let graph = temporary_graph("it-read-your-writes");
    let entity = Entity::new_in("T", &graph).unwrap();

    entity.set("P", "V").unwrap();
    assert_eq!(entity.get("P").unwrap(), Some(Value::from("V")));
    assert!(graph.has_pending_changes());
}

#[test]
fn test_deletion_announces_children_before_entity() {
    let graph = temporary_graph("it-delete-order");
    let mut observed = watch_everything(&graph);

    let entity = Entity::new_in("T", &graph).unwrap();
    entity.add_tags(&["G"]).unwrap();
    entity.add_to_groups(&["Admins"]).unwrap();
    entity.set("P", "V").unwrap();
    graph.commit().unwrap();
    observed.drain();

    entity.delete().unwrap();
    graph.commit().unwrap();

    assert_eq!(
        names(&observed.drain()),
        vec!["removed_tag", "removed_from_group", "removed_property", "deleted"]
    );
}

#[test]
fn test_two_type_criteria_are_both_required() {
    let graph = temporary_graph("it-narrowing");
    let watch: Watch = Watch::new(&graph);
    watch.for_types(&["T"]).for_types(&["Q"]);
    let (delegate, mut events) = EventForwarder::channel();
    watch.set_delegate(&delegate);

    Entity::new_in("T", &graph).unwrap();
    Entity::new_in("Q", &graph).unwrap();
    graph.commit().unwrap();

    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_every_watch_receives_its_own_events() {
    let graph = temporary_graph("it-many-watches");
    let mut all = watch_everything(&graph);
    let tags: Watch = Watch::new(&graph);
    tags.has_tags(&["G"]);
    let (delegate, mut tag_events) = EventForwarder::channel();
    tags.set_delegate(&delegate);

    let entity = Entity::new_in("T", &graph).unwrap();
    entity.add_tags(&["G"]).unwrap();
    graph.commit().unwrap();

    assert_eq!(names(&all.drain()), vec!["inserted", "added_tag"]);
    assert_eq!(names(&drain(&mut tag_events)), vec!["added_tag"]);
}

#[tokio::test]
async fn test_commit_async_delivers_events() {
    let graph = temporary_graph("it-commit-async");
    let mut observed = watch_everything(&graph);

    let entity = Entity::new_in("T", &graph).unwrap();
    entity.set("P", 1).unwrap();
    graph.commit_async().await.unwrap();

    assert_eq!(names(&observed.drain()), vec!["inserted", "added_property"]);
}
