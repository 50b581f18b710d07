use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

use crate::Graph;
use crate::GraphConfig;
use crate::WatchEvent;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// In-memory graph that is gone once the last handle drops
pub(crate) fn temporary_graph(name: &str) -> Graph {
    Graph::open(GraphConfig::temporary(name)).expect("should open temporary graph")
}

/// Every event already forwarded, in delivery order
pub(crate) fn drain<T>(receiver: &mut UnboundedReceiver<WatchEvent<T>>) -> Vec<WatchEvent<T>> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Event names, the shape most ordering assertions need
pub(crate) fn names<T>(events: &[WatchEvent<T>]) -> Vec<&'static str> {
    events.iter().map(WatchEvent::name).collect()
}
