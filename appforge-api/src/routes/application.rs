//! Application REST API Routes
//!
//! Reads are served from the snapshot cache. Writes go straight to the store
//! and invalidate the cache both before and after the write.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};

use appforge_core::{Application, ForgeResult, SearchFilter};

use crate::{
    error::{ApiError, ApiResult},
    state::{ApiCache, AppState},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /application?name=..&table=..&q=.. - Search applications
///
/// The raw query string is matched as-is, without percent-decoding.
pub async fn search_applications(
    State(cache): State<Arc<ApiCache>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let filter = SearchFilter::parse(query.as_deref());
    let snapshot = cache.list().await?;
    let matches = filter.apply(snapshot.iter());

    tracing::debug!(
        total = snapshot.len(),
        matched = matches.len(),
        "Application search"
    );

    Ok(Json(matches).into_response())
}

/// GET /application/:name - One application
pub async fn get_application(
    State(cache): State<Arc<ApiCache>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Application>> {
    let app = cache.get(&name).await?;
    Ok(Json(app))
}

/// POST /application - Create (or overwrite) an application
pub async fn create_application(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Application>> {
    state.cache.invalidate();

    let app = Application::from_slice(&body).map_err(ApiError::write_failed)?;
    persist(&state, &app).await.map_err(ApiError::write_failed)?;

    tracing::info!(name = %app.name, "Application created");
    Ok(Json(app))
}

/// PUT /application/:name - Replace an application
///
/// The path segment wins over any `name` in the body.
pub async fn update_application(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Application>> {
    state.cache.invalidate();

    let app = Application::from_slice_with_name(&body, &name).map_err(ApiError::write_failed)?;
    persist(&state, &app).await.map_err(ApiError::write_failed)?;

    tracing::info!(name = %app.name, "Application updated");
    Ok(Json(app))
}

async fn persist(state: &AppState, app: &Application) -> ForgeResult<()> {
    state.store().write_application(app).await?;
    // A rebuild that raced the write may have installed a snapshot without it.
    state.cache.invalidate();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_storage::{DocumentStore, InMemoryStore};
    use appforge_test_utils::{fixtures, ScriptedGenerator};

    use crate::config::ApiConfig;

    fn state_with(store: Arc<InMemoryStore>) -> AppState {
        AppState::new(
            store,
            Arc::new(ScriptedGenerator::succeeding("/tmp/out")),
            ApiConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_invalidates_even_when_payload_is_bad() {
        let store = Arc::new(InMemoryStore::new());
        let state = state_with(store.clone());

        state.cache.list().await.unwrap();
        assert!(state.cache.stats().cached);

        let result = create_application(State(state.clone()), Bytes::from_static(b"{oops")).await;
        assert!(result.is_err());
        assert!(!state.cache.stats().cached);
    }

    #[tokio::test]
    async fn test_failed_write_is_data_error() {
        let store = Arc::new(InMemoryStore::new());
        store.set_fail_writes(true);
        let state = state_with(store.clone());

        let body = serde_json::to_vec(&fixtures::crm_application()).unwrap();
        let err = create_application(State(state), Bytes::from(body)).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DataError);
    }

    #[tokio::test]
    async fn test_update_forces_path_name() {
        let store = Arc::new(InMemoryStore::new());
        let state = state_with(store.clone());

        let Json(app) = update_application(
            State(state),
            Path("crm".to_string()),
            Bytes::from_static(br#"{"name":"other","table":"customers"}"#),
        )
        .await
        .unwrap();

        assert_eq!(app.name, "crm");
        let stored = store.scan_applications().await.unwrap();
        assert!(stored.contains_key("crm"));
        assert!(!stored.contains_key("other"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let state = state_with(Arc::new(InMemoryStore::new()));
        let err = get_application(State(state.cache.clone()), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ApplicationNotFound);
    }
}
