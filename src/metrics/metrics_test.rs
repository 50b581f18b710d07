use super::*;

#[test]
fn test_encode_metrics_exposes_registered_families() {
    GRAPH_COMMITS_METRIC
        .with_label_values(&["metrics-test", "ok"])
        .inc();

    let text = encode_metrics();
    assert!(text.contains("graph_commits_total"));
    assert!(text.contains("metrics-test"));
}

#[test]
fn test_register_is_idempotent() {
    register_custom_metrics();
    register_custom_metrics();
    WATCH_RESOLUTION_MISSES_METRIC
        .with_label_values(&["metrics-test"])
        .inc();

    let families = REGISTRY.gather();
    let misses = families
        .iter()
        .filter(|f| f.get_name() == "watch_resolution_misses_total")
        .count();
    assert_eq!(misses, 1);
}
