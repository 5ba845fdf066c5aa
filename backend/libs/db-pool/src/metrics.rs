//! Prometheus collectors for the shared pool
//!
//! Connection counts are sampled by the updater task spawned in
//! `create_pool`; acquisitions are timed by `acquire_with_metrics`.

use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};
use sqlx::{pool::PoolConnection, PgPool, Postgres};
use std::time::Instant;

lazy_static::lazy_static! {
    static ref SHARED_POOL_CONNECTIONS: IntGaugeVec = register_int_gauge_vec!(
        "shared_pool_connections",
        "Connections in the shared pool by state (idle, in_use, max)",
        &["service", "state"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref SHARED_POOL_ACQUIRE_SECONDS: HistogramVec = register_histogram_vec!(
        "shared_pool_acquire_seconds",
        "Time spent waiting for a shared pool connection",
        &["service", "outcome"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref SHARED_POOL_ACQUIRE_FAILURES: IntCounterVec = register_int_counter_vec!(
        "shared_pool_acquire_failures_total",
        "Failed shared pool acquisitions by reason",
        &["service", "reason"]
    ).expect("Prometheus metrics registration should succeed at startup");

    static ref SHARED_POOL_INITS: IntCounterVec = register_int_counter_vec!(
        "shared_pool_inits_total",
        "Attempts to initialize the process-wide pool",
        &["service", "outcome"]
    ).expect("Prometheus metrics registration should succeed at startup");
}

/// Sample idle, in-use and max connection counts.
pub(crate) fn update_pool_metrics(pool: &PgPool, service: &str) {
    let size = i64::from(pool.size());
    let idle = pool.num_idle() as i64;
    let max = i64::from(pool.options().get_max_connections());

    for (state, value) in [("idle", idle), ("in_use", size - idle), ("max", max)] {
        SHARED_POOL_CONNECTIONS
            .with_label_values(&[service, state])
            .set(value);
    }
}

/// Count one initialization attempt of the shared pool.
pub(crate) fn record_init(service: &str, succeeded: bool) {
    let outcome = if succeeded { "ok" } else { "error" };
    SHARED_POOL_INITS.with_label_values(&[service, outcome]).inc();
}

fn failure_reason(err: &sqlx::Error) -> &'static str {
    match err {
        sqlx::Error::PoolTimedOut => "timeout",
        sqlx::Error::PoolClosed => "closed",
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => "io",
        _ => "other",
    }
}

/// `pool.acquire()` with wait time and failure accounting.
pub async fn acquire_with_metrics(
    pool: &PgPool,
    service: &str,
) -> Result<PoolConnection<Postgres>, sqlx::Error> {
    let start = Instant::now();
    let result = pool.acquire().await;
    let outcome = if result.is_ok() { "ok" } else { "error" };

    SHARED_POOL_ACQUIRE_SECONDS
        .with_label_values(&[service, outcome])
        .observe(start.elapsed().as_secs_f64());

    if let Err(e) = &result {
        SHARED_POOL_ACQUIRE_FAILURES
            .with_label_values(&[service, failure_reason(e)])
            .inc();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason() {
        assert_eq!(failure_reason(&sqlx::Error::PoolTimedOut), "timeout");
        assert_eq!(failure_reason(&sqlx::Error::PoolClosed), "closed");
        assert_eq!(
            failure_reason(&sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "refused"
            ))),
            "io"
        );
        assert_eq!(failure_reason(&sqlx::Error::RowNotFound), "other");
    }

    #[test]
    fn test_record_init_counts_by_outcome() {
        record_init("metrics-test", true);
        record_init("metrics-test", false);
        record_init("metrics-test", false);

        assert_eq!(
            SHARED_POOL_INITS
                .with_label_values(&["metrics-test", "ok"])
                .get(),
            1
        );
        assert_eq!(
            SHARED_POOL_INITS
                .with_label_values(&["metrics-test", "error"])
                .get(),
            2
        );
    }
}
