use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};
use std::time::Duration;

lazy_static! {
    /// Content creation attempts by kind and result (success/error).
    pub static ref CONTENT_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "thread_content_created_total",
        "Content creation attempts segmented by kind and result",
        &["kind", "result"]
    )
    .expect("failed to register thread_content_created_total");

    /// Revalidation signals by result (success/error/disabled).
    pub static ref REVALIDATION_TOTAL: IntCounterVec = register_int_counter_vec!(
        "thread_revalidation_total",
        "Path revalidation signals segmented by result",
        &["result"]
    )
    .expect("failed to register thread_revalidation_total");

    /// Read latency by operation (feed/detail) and kind.
    pub static ref READ_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "thread_read_duration_seconds",
        "Feed and detail read duration",
        &["operation", "kind"]
    )
    .expect("failed to register thread_read_duration_seconds");

    /// HTTP requests by method and status code.
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "thread_http_requests_total",
        "HTTP requests segmented by method and status",
        &["method", "status"]
    )
    .expect("failed to register thread_http_requests_total");
}

pub fn record_created(kind: &str, result: &str) {
    CONTENT_CREATED_TOTAL.with_label_values(&[kind, result]).inc();
}

pub fn record_revalidation(result: &str) {
    REVALIDATION_TOTAL.with_label_values(&[result]).inc();
}

pub fn record_read(operation: &str, kind: &str, duration: Duration) {
    READ_DURATION_SECONDS
        .with_label_values(&[operation, kind])
        .observe(duration.as_secs_f64());
}

pub fn record_http_request(method: &str, status: u16) {
    let status = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, status.as_str()])
        .inc();
}
