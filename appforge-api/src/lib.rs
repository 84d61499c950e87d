//! appforge API - REST Layer
//!
//! Serves reference documents and application definitions from a data root
//! and forwards generation requests to an external code generation engine.
//!
//! Application reads go through a snapshot cache
//! ([`appforge_storage::ApplicationCache`]); writes go straight to disk and
//! invalidate it.

pub mod config;
pub mod error;
pub mod generation;
mod macros;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use generation::{GenerationTrigger, ProcessGenerator, UnconfiguredGenerator};
pub use routes::create_api_router;
pub use state::{ApiCache, AppState};
