//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Shelfmark metrics
pub const METRICS_PREFIX: &str = "shelfmark";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms - P50 target
    0.075, // 75ms
    0.100, // 100ms
    0.150, // 150ms - P99 target
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Catalog metrics
    describe_counter!(
        format!("{}_books_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total books created"
    );

    describe_counter!(
        format!("{}_books_deleted_total", METRICS_PREFIX),
        Unit::Count,
        "Total books deleted"
    );

    describe_counter!(
        format!("{}_relations_updated_total", METRICS_PREFIX),
        Unit::Count,
        "Total user-book relation updates"
    );

    describe_counter!(
        format!("{}_users_registered_total", METRICS_PREFIX),
        Unit::Count,
        "Total users registered"
    );

    // Database metrics
    describe_histogram!(
        format!("{}_db_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Database query latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a catalog mutation by kind ("book_created", "book_deleted", ...)
pub fn record_catalog_event(kind: &str) {
    match kind {
        "book_created" => {
            counter!(format!("{}_books_created_total", METRICS_PREFIX)).increment(1)
        }
        "book_deleted" => {
            counter!(format!("{}_books_deleted_total", METRICS_PREFIX)).increment(1)
        }
        "relation_updated" => {
            counter!(format!("{}_relations_updated_total", METRICS_PREFIX)).increment(1)
        }
        "user_registered" => {
            counter!(format!("{}_users_registered_total", METRICS_PREFIX)).increment(1)
        }
        other => {
            tracing::debug!(kind = other, "Unrecognized catalog event kind");
        }
    }
}
