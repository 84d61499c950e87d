//! Types exchanged with the external code-generation engine.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Body of a generation request.
///
/// All fields are optional at the type level: presence is only enforced
/// when validation is switched on by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub templates: Option<Vec<String>>,
}

impl GenerationRequest {
    /// Check that application, session and templates are all present and non-empty.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let missing = |field: &str| GenerationError::InvalidRequest {
            reason: format!("Required field '{}' is missing", field),
        };

        if self.application.as_deref().map_or(true, str::is_empty) {
            return Err(missing("application"));
        }
        if self.session.as_deref().map_or(true, str::is_empty) {
            return Err(missing("session"));
        }
        if self.templates.as_ref().map_or(true, Vec::is_empty) {
            return Err(missing("templates"));
        }
        Ok(())
    }
}

/// Successful generation result returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    pub application: Option<String>,
    pub output_path: PathBuf,
}

/// The code-generation engine.
///
/// Given an application name, a session token and a list of template
/// identifiers, produce an output folder or fail.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(
        &self,
        application: Option<&str>,
        session: Option<&str>,
        templates: &[String],
    ) -> Result<PathBuf, GenerationError>;
}
