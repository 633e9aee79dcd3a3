//! Prometheus metrics for the Quarry server.
//!
//! Exposes metrics for download outcomes, missing-symbol telemetry, and fetch
//! dispatch activity.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no per-symbol data (no debug files, debug IDs, or upstream
//! URLs), only aggregate counts and latencies.
//!
//! **Deployment Requirement**: The `/metrics` endpoint MUST be network-restricted
//! to authorized Prometheus scraper IPs only. This should be enforced at the
//! infrastructure level (firewall, load balancer, or reverse proxy rules).
//! Do NOT expose `/metrics` on public networks.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Download outcome metrics
pub static DOWNLOADS_FOUND: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_downloads_found_total",
        "Total number of download requests resolved to an upstream URL",
    )
    .expect("metric creation failed")
});

pub static DOWNLOADS_MISSING: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_downloads_missing_total",
        "Total number of download requests that missed every source",
    )
    .expect("metric creation failed")
});

pub static DOWNLOADS_IGNORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_downloads_ignored_total",
        "Total number of download requests ignored without a lookup",
    )
    .expect("metric creation failed")
});

// Telemetry metrics
pub static MISSES_RECORDED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_misses_recorded_total",
        "Total number of missing-symbol records written",
    )
    .expect("metric creation failed")
});

pub static TELEMETRY_DROPPED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "quarry_telemetry_dropped_total",
            "Total missing-symbol records dropped by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

// Fetch dispatch metrics
pub static FETCH_DISPATCHES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_fetch_dispatches_total",
        "Total number of background fetches dispatched",
    )
    .expect("metric creation failed")
});

pub static FETCH_SUPPRESSED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_fetch_suppressed_total",
        "Total number of fetch dispatches suppressed by the trigger window",
    )
    .expect("metric creation failed")
});

pub static FETCH_DISPATCH_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_fetch_dispatch_failures_total",
        "Total number of fetch dispatches that failed",
    )
    .expect("metric creation failed")
});

pub static TRIGGER_EVICTIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_trigger_evictions_total",
        "Total number of trigger entries evicted to make room at capacity",
    )
    .expect("metric creation failed")
});

// Report export metrics
pub static EXPORT_ROWS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_export_rows_total",
        "Total number of rows written to missing-symbol reports",
    )
    .expect("metric creation failed")
});

pub static EXPORT_ROWS_SKIPPED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "quarry_export_rows_skipped_total",
        "Total number of malformed records skipped during report export",
    )
    .expect("metric creation failed")
});

// Timing metrics
pub static DOWNLOAD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "quarry_download_duration_seconds",
            "Time taken to serve a download request",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
/// This allows safe use in integration tests or when embedding multiple routers.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(DOWNLOADS_FOUND.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOWNLOADS_MISSING.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOWNLOADS_IGNORED.clone()))
            .expect("metric registration failed");

        // Telemetry metrics
        REGISTRY
            .register(Box::new(MISSES_RECORDED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TELEMETRY_DROPPED.clone()))
            .expect("metric registration failed");

        // Fetch dispatch metrics
        REGISTRY
            .register(Box::new(FETCH_DISPATCHES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FETCH_SUPPRESSED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FETCH_DISPATCH_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TRIGGER_EVICTIONS.clone()))
            .expect("metric registration failed");

        // Report export metrics
        REGISTRY
            .register(Box::new(EXPORT_ROWS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(EXPORT_ROWS_SKIPPED.clone()))
            .expect("metric registration failed");

        // Timing metrics
        REGISTRY
            .register(Box::new(DOWNLOAD_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Helper to record dropped telemetry by reason.
pub fn record_telemetry_drop(reason: &str) {
    TELEMETRY_DROPPED.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // This would panic if any metric creation failed
        register_metrics();
    }
}
