//! Error Types for appforge API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum, the closed set of failure kinds a caller can observe
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Library errors ([`ForgeError`]) are translated here and nowhere else.

use appforge_core::{DocumentKind, ForgeError, GenerationError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No (method, path) combination matched
    RouteNotFound,

    /// Create/update/generate body missing or not the expected shape
    DataError,

    // ========================================================================
    // Resource Missing
    // ========================================================================
    TemplateIndexNotFound,
    TableIndexNotFound,
    TableNotFound,
    ApplicationNotFound,

    /// The code-generation engine rejected or failed the request
    GenerationFailed,

    /// Anything else; never described to the caller
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    ///
    /// Only an unmatched route is a 404; every other failure is a 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::RouteNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DataError
            | ErrorCode::TemplateIndexNotFound
            | ErrorCode::TableIndexNotFound
            | ErrorCode::TableNotFound
            | ErrorCode::ApplicationNotFound
            | ErrorCode::GenerationFailed
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the fixed message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::RouteNotFound => "Not found",
            ErrorCode::DataError => "Application data error",
            ErrorCode::TemplateIndexNotFound => "Template index not found",
            ErrorCode::TableIndexNotFound => "Table index not found",
            ErrorCode::TableNotFound => "Table definition not found",
            ErrorCode::ApplicationNotFound => "Application not found",
            ErrorCode::GenerationFailed => "Code generation failed",
            ErrorCode::InternalError => "Internal server error",
        }
    }

    /// True for codes meaning "the requested document does not exist".
    pub fn is_resource_missing(&self) -> bool {
        matches!(
            self,
            ErrorCode::TemplateIndexNotFound
                | ErrorCode::TableIndexNotFound
                | ErrorCode::TableNotFound
                | ErrorCode::ApplicationNotFound
        )
    }

    /// Whether the response carries a body at all.
    pub fn has_body(&self) -> bool {
        !matches!(self, ErrorCode::RouteNotFound | ErrorCode::InternalError)
    }

    /// The resource-missing code for a kind of document.
    pub fn missing(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::TemplateIndex => ErrorCode::TemplateIndexNotFound,
            DocumentKind::TableIndex => ErrorCode::TableIndexNotFound,
            DocumentKind::Table => ErrorCode::TableNotFound,
            DocumentKind::Application => ErrorCode::ApplicationNotFound,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn route_not_found() -> Self {
        Self::from_code(ErrorCode::RouteNotFound)
    }

    pub fn data_error() -> Self {
        Self::from_code(ErrorCode::DataError)
    }

    /// Create an InternalError. The message is logged, never sent.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a GenerationFailed error relaying the engine's message.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, message)
    }

    // ========================================================================
    // Boundary translations
    // ========================================================================

    /// Translate a failed static document read.
    ///
    /// Any failure reads as the document being missing; causes other than
    /// absence are logged.
    pub fn static_read(code: ErrorCode, err: ForgeError) -> Self {
        if !err.is_not_found() {
            tracing::warn!(error = %err, code = %code, "Static document read failed");
        }
        Self::from_code(code)
    }

    /// Translate a failed create or update.
    ///
    /// Payload and write failures are reported alike as a data error.
    pub fn write_failed(err: ForgeError) -> Self {
        tracing::warn!(error = %err, "Application write rejected");
        Self::data_error()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Route-not-found and internal errors are sent with an empty body; all
/// other codes carry `{code, message}`. The code is also attached as a
/// response extension for the middleware stack.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code;

        let mut response = if code.has_body() {
            (status, Json(self)).into_response()
        } else {
            if code == ErrorCode::InternalError {
                tracing::error!(message = %self.message, "Unhandled failure during dispatch");
            }
            status.into_response()
        };
        response.extensions_mut().insert(code);
        response
    }
}

// ============================================================================
// CONVERSIONS FROM LIBRARY ERRORS
// ============================================================================

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRequest { reason } => {
                tracing::debug!(%reason, "Generation request rejected");
                ApiError::data_error()
            }
            GenerationError::EngineFailed { reason } => ApiError::generation_failed(reason),
            other => ApiError::generation_failed(other.to_string()),
        }
    }
}

impl From<ForgeError> for ApiError {
    fn from(err: ForgeError) -> Self {
        match err {
            ForgeError::Store(StoreError::NotFound { kind, .. }) => {
                ApiError::from_code(ErrorCode::missing(kind))
            }
            ForgeError::Data { .. } => ApiError::data_error(),
            ForgeError::Generation(err) => err.into(),
            other => ApiError::internal_error(other.to_string()),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::debug!(error = %err, "Unparsable request body");
        ApiError::data_error()
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
