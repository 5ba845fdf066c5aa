//! Prometheus metrics for the link repair background job

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};
use std::time::Duration;

/// Total number of repair sweeps (success/error)
static REPAIR_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "link_repair_runs_total",
        "Total number of link repair sweeps (success/error)",
        &["status"]
    )
    .expect("failed to register link_repair_runs_total")
});

static REPAIR_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "link_repair_duration_seconds",
        "Duration of link repair sweeps",
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register link_repair_duration_seconds")
});

/// References restored per kind and link (author/parent)
static LINKS_REPAIRED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "link_repair_links_restored_total",
        "Back-references restored by the link repair job",
        &["kind", "link"]
    )
    .expect("failed to register link_repair_links_restored_total")
});

pub fn record_repair_run(status: &str) {
    REPAIR_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_repair_duration(duration: Duration) {
    REPAIR_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_links_repaired(kind: &str, link: &str, count: u64) {
    LINKS_REPAIRED_TOTAL
        .with_label_values(&[kind, link])
        .inc_by(count);
}
