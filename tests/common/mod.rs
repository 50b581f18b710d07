use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use watchgraph::Entity;
use watchgraph::EventForwarder;
use watchgraph::Graph;
use watchgraph::GraphConfig;
use watchgraph::Watch;
use watchgraph::WatchEvent;

pub fn temporary_graph(name: &str) -> Graph {
    Graph::open(GraphConfig::temporary(name)).expect("should open temporary graph")
}

/// Watch over every type, tag, group and property, wired to an event channel
pub struct Observed {
    pub watch: Watch,
    /// The watch only holds its delegate weakly
    pub delegate: Arc<EventForwarder<Entity>>,
    pub events: UnboundedReceiver<WatchEvent<Entity>>,
}

impl Observed {
    pub fn drain(&mut self) -> Vec<WatchEvent<Entity>> {
        drain(&mut self.events)
    }
}

pub fn watch_everything(graph: &Graph) -> Observed {
    let watch: Watch = Watch::new(graph);
    watch
        .for_types(&["*"])
        .has_tags(&["*"])
        .member_of(&["*"])
        .where_properties(&["*"]);
    let (delegate, events) = EventForwarder::channel();
    watch.set_delegate(&delegate);
    Observed {
        watch,
        delegate,
        events,
    }
}

pub fn drain(events: &mut UnboundedReceiver<WatchEvent<Entity>>) -> Vec<WatchEvent<Entity>> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn names(events: &[WatchEvent<Entity>]) -> Vec<&'static str> {
    events.iter().map(WatchEvent::name).collect()
}
