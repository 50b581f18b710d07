use std::sync::mpsc;
use std::time::Duration;

use watchgraph::graph;
use watchgraph::Entity;
use watchgraph::Error;
use watchgraph::EventForwarder;
use watchgraph::GraphConfig;
use watchgraph::Source;
use watchgraph::Watch;
use watchgraph::WatchStatus;

use crate::common::drain;
use crate::common::names;
use crate::common::temporary_graph;
use crate::common::watch_everything;

/// # Case: events of a commit made while paused are never replayed
#[test]
fn test_pause_skips_without_replay() {
    let graph = temporary_graph("it-pause");
    let mut observed = watch_everything(&graph);

    observed.watch.pause();
    let missed = Entity::new_in("T", &graph).unwrap();
    missed.add_tags(&["G"]).unwrap();
    graph.commit().unwrap();
    observed.watch.resume();
    assert!(observed.drain().is_empty());

    missed.add_tags(&["H"]).unwrap();
    graph.commit().unwrap();
    assert_eq!(names(&observed.drain()), vec!["added_tag"]);
}

#[test]
fn test_dropped_watch_stops_receiving() {
    let graph = temporary_graph("it-drop");
    let watch: Watch = Watch::new(&graph);
    watch.for_types(&["T"]);
    let (delegate, mut events) = EventForwarder::channel();
    watch.set_delegate(&delegate);
    assert_eq!(graph.watchers().len(), 1);

    drop(watch);
    assert!(graph.watchers().is_empty());
    assert_eq!(graph.listener_count(Source::Local), 0);

    Entity::new_in("T", &graph).unwrap();
    graph.commit().unwrap();
    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_watch_status_transitions() {
    let graph = temporary_graph("it-status");
    let watch: Watch = Watch::new(&graph);
    assert_eq!(watch.status(), WatchStatus::Running);

    watch.pause();
    assert_eq!(graph.watchers().status(watch.id()), Some(WatchStatus::Paused));
    watch.resume();
    assert_eq!(graph.watchers().status(watch.id()), Some(WatchStatus::Running));
}

#[test]
fn test_async_commit_completion() {
    let graph = temporary_graph("it-async-commit");
    let mut observed = watch_everything(&graph);
    Entity::new_in("T", &graph).unwrap();

    let (tx, rx) = mpsc::channel();
    graph.async_commit(move |result| {
        tx.send(result.map_err(|e| e.to_string())).unwrap();
    });

    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), Ok(()));
    assert_eq!(names(&observed.drain()), vec!["inserted"]);
}

#[test]
fn test_empty_names_are_rejected_at_call_site() {
    let graph = temporary_graph("it-invalid-input");

    assert!(matches!(
        Entity::new_in("", &graph),
        Err(Error::InvalidInput(_))
    ));
    let entity = Entity::new_in("T", &graph).unwrap();
    assert!(matches!(entity.set("", "V"), Err(Error::InvalidInput(_))));
    assert!(matches!(entity.remove_tags(&[""]), Err(Error::InvalidInput(_))));
}

#[test]
fn test_persistent_graph_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GraphConfig::default().renamed("it-persistent");
    config.storage.db_root_dir = dir.path().to_path_buf();
    config.storage.flush_every_ms = None;

    let id = {
        let graph = watchgraph::Graph::open(config.clone()).unwrap();
        let entity = Entity::new_in("T", &graph).unwrap();
        entity.set("P", "V").unwrap();
        graph.commit().unwrap();
        entity.id()
    };

    let graph = watchgraph::Graph::open(config).unwrap();
    let entity = Entity::load(&graph, id).unwrap().expect("entity should survive reopen");
    assert_eq!(entity.get("P").unwrap().unwrap().as_str(), Some("V"));
}

#[test]
fn test_named_graphs_are_shared_handles() {
    // the default template comes from the environment; keep it in memory
    temp_env::with_var("WATCHGRAPH__STORAGE__TEMPORARY", Some("true"), || {
        graph::shutdown_all();
        let first = graph::named("it-shared").unwrap();
        let second = graph::named("it-shared").unwrap();
        assert_eq!(first, second);

        let entity = Entity::new_named("T", "it-shared").unwrap();
        assert!(second.has_pending_changes());
        assert_eq!(entity.graph(), &first);
        assert!(graph::release("it-shared").is_some());
        graph::shutdown_all();
    });
}
