use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref GRAPH_COMMITS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("graph_commits_total", "Local commits by outcome"),
        &["graph", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_EVENTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_events_dispatched_total", "Delegate events delivered"),
        &["event", "source"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_DISPATCH_FAULTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_dispatch_faults_total", "Records dropped from dispatch by a fault"),
        &["graph"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_RESOLUTION_MISSES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_resolution_misses_total", "Remote identifiers that did not resolve"),
        &["graph"]
    )
    .expect("metric can not be created");
}

static REGISTER: Once = Once::new();

/// Registers every graph metric with [`REGISTRY`]. Safe to call repeatedly.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        let collectors: [Box<dyn prometheus::core::Collector>; 4] = [
            Box::new(GRAPH_COMMITS_METRIC.clone()),
            Box::new(WATCH_EVENTS_METRIC.clone()),
            Box::new(WATCH_DISPATCH_FAULTS_METRIC.clone()),
            Box::new(WATCH_RESOLUTION_MISSES_METRIC.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                error!("collector can not be registered: {:?}", e);
            }
        }
    });
}

/// Text exposition of [`REGISTRY`], for embedding into a host's own endpoint.
pub fn encode_metrics() -> String {
    register_custom_metrics();

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

#[cfg(test)]
mod metrics_test;
