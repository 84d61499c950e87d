//! appforge API Server Entry Point
//!
//! Reads configuration from the environment, checks the data root and
//! starts the Axum HTTP server.

use appforge_api::telemetry::{init_tracer, TelemetryConfig};
use appforge_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let addr = api_config.bind_addr()?;

    let state = AppState::from_config(api_config);
    if let Err(e) = state.store().ping().await {
        // Keep serving: requests will report the failure per route.
        tracing::warn!(
            error = %e,
            data_dir = %state.config.data_dir.display(),
            "Data root is not usable"
        );
    }

    let app = create_api_router(state);

    tracing::info!(%addr, "Starting appforge API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
