//! REST API Routes Module
//!
//! Resource routes are mounted under the configured prefix:
//! - GET  /template, /table, /table/:name
//! - GET  /application (search), /application/:name
//! - POST /application, PUT /application/:name
//! - POST /generate
//!
//! Health checks (/health/*) and metrics (/metrics) live outside the prefix.
//! Every other (method, path) combination is a 404 with an empty body,
//! including known paths with the wrong method.

pub mod application;
pub mod generate;
pub mod health;
pub mod reference;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::error::{ApiError, ErrorCode};
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// FALLBACKS
// ============================================================================

/// Fallback for unmatched paths and unsupported methods.
pub async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Keep a method router from answering 405.
fn strict(method_router: MethodRouter<AppState>) -> MethodRouter<AppState> {
    method_router.fallback(route_not_found)
}

/// GET handlers also answer HEAD; resource routes do not.
async fn reject_head(request: Request, next: Next) -> Response {
    if request.method() == Method::HEAD {
        return ApiError::route_not_found().into_response();
    }
    next.run(request).await
}

/// Promote resource-missing failures to 404 when configured.
async fn missing_status_middleware(
    State(config): State<Arc<ApiConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if config.missing_as_404 {
        let missing = response
            .extensions()
            .get::<ErrorCode>()
            .is_some_and(ErrorCode::is_resource_missing);
        if missing {
            *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
        }
    }
    response
}

// ============================================================================
// ROUTERS
// ============================================================================

/// Resource routes, relative to the API prefix.
pub fn resource_router() -> Router<AppState> {
    Router::new()
        .route("/template", strict(get(reference::template_index)))
        .route("/table", strict(get(reference::table_index)))
        .route("/table/:name", strict(get(reference::table_definition)))
        .route(
            "/application",
            strict(get(application::search_applications).post(application::create_application)),
        )
        .route(
            "/application/:name",
            strict(get(application::get_application).put(application::update_application)),
        )
        .route("/generate", strict(post(generate::generate)))
        .route_layer(from_fn(reject_head))
}

/// Create the complete router: resource routes under the configured prefix,
/// health checks, metrics, CORS and the observability stack.
pub fn create_api_router(state: AppState) -> Router {
    let config = state.config.clone();

    let router = if config.api_prefix.is_empty() {
        Router::new().merge(resource_router())
    } else {
        Router::new().nest(&config.api_prefix, resource_router())
    };

    // Execution order: CORS -> Observability -> Trace -> 404 promotion -> Handler
    router
        .nest("/health", health::create_router())
        .route("/metrics", strict(get(metrics_handler)))
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(build_cors_layer(&config))
                .layer(from_fn_with_state(config.clone(), observability_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(from_fn_with_state(config.clone(), missing_status_middleware)),
        )
        .with_state(state)
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no origins configured, any origin is allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}
