//! Error types for appforge operations

use std::path::PathBuf;
use thiserror::Error;

/// What kind of document a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    TemplateIndex,
    TableIndex,
    Table,
    Application,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DocumentKind::TemplateIndex => "template index",
            DocumentKind::TableIndex => "table index",
            DocumentKind::Table => "table",
            DocumentKind::Application => "application",
        };
        f.write_str(label)
    }
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {kind} '{name}'")]
    NotFound { kind: DocumentKind, name: String },

    #[error("I/O failure on {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid document name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Storage task failed: {reason}")]
    TaskFailed { reason: String },
}

/// Errors reported by (or on the way to) the code-generation engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Code generator not configured")]
    NotConfigured,

    #[error("Invalid generation request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Code generation failed: {reason}")]
    EngineFailed { reason: String },

    #[error("Code generation timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Master error type for all appforge errors.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Data error: {reason}")]
    Data { reason: String },
}

impl ForgeError {
    /// Create a data error for an unusable payload.
    pub fn data(reason: impl Into<String>) -> Self {
        ForgeError::Data {
            reason: reason.into(),
        }
    }

    /// True when the error means "the named document does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, ForgeError::Store(StoreError::NotFound { .. }))
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::data(err.to_string())
    }
}

/// Result type alias for appforge operations.
pub type ForgeResult<T> = Result<T, ForgeError>;

// =============================================================================
// TESTS
// =============================================================================
