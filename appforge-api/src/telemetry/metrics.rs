//! Prometheus Metrics Definitions
//!
//! Defines all appforge metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, register_int_counter,
    register_int_gauge, CounterVec, Encoder, Gauge, HistogramVec, IntCounter, IntGauge,
    TextEncoder,
};

use appforge_storage::CacheStats;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiCache;

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<ApiResult<AppforgeMetrics>> = Lazy::new(AppforgeMetrics::new);

/// Container for all appforge metrics.
#[derive(Clone)]
pub struct AppforgeMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Reads served from a held snapshot
    pub cache_hits_total: IntCounter,

    /// Full rescans of the data root
    pub cache_rebuilds_total: IntCounter,

    /// Snapshot invalidations
    pub cache_invalidations_total: IntCounter,

    /// Applications in the held snapshot
    pub cache_entries: IntGauge,

    /// Fraction of cache reads served without a rescan
    pub cache_hit_ratio: Gauge,
}

fn registration_failed(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl AppforgeMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "appforge_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "appforge_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            cache_hits_total: register_int_counter!(
                "appforge_cache_hits_total",
                "Application reads served from the cached snapshot"
            )
            .map_err(|e| registration_failed("cache_hits_total", e))?,

            cache_rebuilds_total: register_int_counter!(
                "appforge_cache_rebuilds_total",
                "Full rescans of the application directory"
            )
            .map_err(|e| registration_failed("cache_rebuilds_total", e))?,

            cache_invalidations_total: register_int_counter!(
                "appforge_cache_invalidations_total",
                "Application cache invalidations"
            )
            .map_err(|e| registration_failed("cache_invalidations_total", e))?,

            cache_entries: register_int_gauge!(
                "appforge_cache_entries",
                "Applications held in the cached snapshot"
            )
            .map_err(|e| registration_failed("cache_entries", e))?,

            cache_hit_ratio: register_gauge!(
                "appforge_cache_hit_ratio",
                "Fraction of application reads served from the cached snapshot"
            )
            .map_err(|e| registration_failed("cache_hit_ratio", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Bring the cache counters up to date with the cache's own statistics.
    ///
    /// Counters only move forward, so only the positive difference is added.
    pub fn sync_cache(&self, stats: &CacheStats) {
        advance(&self.cache_hits_total, stats.hits);
        advance(&self.cache_rebuilds_total, stats.rebuilds);
        advance(&self.cache_invalidations_total, stats.invalidations);
        self.cache_entries.set(stats.entries as i64);
        self.cache_hit_ratio.set(stats.hit_rate());
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler(State(cache): State<Arc<ApiCache>>) -> impl IntoResponse {
    match METRICS.as_ref() {
        Ok(metrics) => metrics.sync_cache(&cache.stats()),
        Err(e) => tracing::warn!(error = %e, "Metrics unavailable"),
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
