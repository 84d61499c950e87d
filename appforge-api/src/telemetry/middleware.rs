//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Wraps every request in an `http_request` span, records Prometheus
//! metrics and logs completion.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info_span, Instrument};

use super::metrics::METRICS;
use crate::config::ApiConfig;

/// Label used for paths that match no route.
const UNMATCHED: &str = "unmatched";

/// Normalize a request path into a route label.
///
/// Application and table names are replaced with placeholders, and any
/// path outside the known routes collapses to one label, so client input
/// never creates new label values.
pub(crate) fn normalize_path(path: &str, prefix: &str) -> String {
    if matches!(path, "/metrics" | "/health/ping" | "/health/live" | "/health/ready") {
        return path.to_string();
    }

    let Some(rest) = path.strip_prefix(prefix) else {
        return UNMATCHED.to_string();
    };

    let route = match rest.split('/').collect::<Vec<_>>().as_slice() {
        ["", "template"] => "/template",
        ["", "table"] => "/table",
        ["", "table", name] if !name.is_empty() => "/table/{name}",
        ["", "application"] => "/application",
        ["", "application", name] if !name.is_empty() => "/application/{name}",
        ["", "generate"] => "/generate",
        _ => return UNMATCHED.to_string(),
    };

    format!("{}{}", prefix, route)
}

/// Observability middleware for Axum.
///
/// This middleware wraps every request with:
/// 1. A tracing span carrying method, target and route
/// 2. Prometheus metrics recording
/// 3. Request completion logging
pub async fn observability_middleware(
    State(config): State<Arc<ApiConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = normalize_path(&path, &config.api_prefix);

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
    );

    let response = next.run(request).instrument(span).await;

    let duration = start.elapsed();
    let status = response.status();

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_http_request(
            method.as_str(),
            &route,
            status.as_u16(),
            duration.as_secs_f64(),
        );
    }

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
