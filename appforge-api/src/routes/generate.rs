//! Code Generation Route

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};

use appforge_core::{GenerationOutcome, GenerationRequest};

use crate::{error::ApiResult, generation::GenerationTrigger};

/// POST /generate - Forward a request to the code generator
///
/// An unparsable body never reaches the engine.
pub async fn generate(
    State(trigger): State<Arc<GenerationTrigger>>,
    body: Bytes,
) -> ApiResult<Json<GenerationOutcome>> {
    let request: GenerationRequest = serde_json::from_slice(&body)?;
    let outcome = trigger.run(request).await?;
    Ok(Json(outcome))
}
