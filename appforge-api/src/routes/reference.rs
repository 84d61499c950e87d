//! Static Reference Document Routes
//!
//! Template index, table index and table definitions are served verbatim
//! from the data root. They are never cached and never parsed.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use appforge_core::StaticDocument;

use crate::{
    error::{ApiError, ApiResult, ErrorCode},
    state::AppState,
};

async fn serve_static(state: &AppState, doc: StaticDocument, missing: ErrorCode) -> ApiResult<Response> {
    let bytes = state
        .store()
        .read_static(&doc)
        .await
        .map_err(|e| ApiError::static_read(missing, e))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

/// GET /template - Template index
pub async fn template_index(State(state): State<AppState>) -> ApiResult<Response> {
    serve_static(&state, StaticDocument::TemplateIndex, ErrorCode::TemplateIndexNotFound).await
}

/// GET /table - Table index
pub async fn table_index(State(state): State<AppState>) -> ApiResult<Response> {
    serve_static(&state, StaticDocument::TableIndex, ErrorCode::TableIndexNotFound).await
}

/// GET /table/:name - One table definition
pub async fn table_definition(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    serve_static(&state, StaticDocument::Table(name), ErrorCode::TableNotFound).await
}
