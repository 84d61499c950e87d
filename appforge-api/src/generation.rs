//! Code generation trigger.
//!
//! [`GenerationTrigger`] sits between the `/generate` route and a
//! [`CodeGenerator`]: it optionally validates the request, bounds the engine
//! call with a timeout and shapes the result. [`ProcessGenerator`] reaches the
//! engine through an external command.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use appforge_core::{CodeGenerator, GenerationError, GenerationOutcome, GenerationRequest};
use async_trait::async_trait;

// ============================================================================
// TRIGGER
// ============================================================================

/// Forwards generation requests to the configured engine.
#[derive(Clone)]
pub struct GenerationTrigger {
    generator: Arc<dyn CodeGenerator>,
    timeout: Option<Duration>,
    validate: bool,
}

impl GenerationTrigger {
    pub fn new(generator: Arc<dyn CodeGenerator>) -> Self {
        Self {
            generator,
            timeout: None,
            validate: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Require application, session and templates before calling the engine.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Run one generation request to completion.
    pub async fn run(&self, request: GenerationRequest) -> Result<GenerationOutcome, GenerationError> {
        if self.validate {
            request.validate()?;
        }

        let templates = request.templates.clone().unwrap_or_default();
        let started = Instant::now();
        tracing::info!(
            application = ?request.application,
            templates = templates.len(),
            "Code generation requested"
        );

        let call = self.generator.generate(
            request.application.as_deref(),
            request.session.as_deref(),
            &templates,
        );

        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout {
                    secs: limit.as_secs(),
                }),
            },
            None => call.await,
        };

        match result {
            Ok(output_path) => {
                tracing::info!(
                    application = ?request.application,
                    output_path = %output_path.display(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Code generation completed"
                );
                Ok(GenerationOutcome {
                    application: request.application,
                    output_path,
                })
            }
            Err(err) => {
                tracing::warn!(application = ?request.application, error = %err, "Code generation failed");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for GenerationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationTrigger")
            .field("timeout", &self.timeout)
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ENGINES
// ============================================================================

/// Engine used when no generator command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredGenerator;

#[async_trait]
impl CodeGenerator for UnconfiguredGenerator {
    async fn generate(
        &self,
        _application: Option<&str>,
        _session: Option<&str>,
        _templates: &[String],
    ) -> Result<PathBuf, GenerationError> {
        Err(GenerationError::NotConfigured)
    }
}

/// Engine reached through an external command.
///
/// The command is invoked as `<program> <args...> <application> <session>
/// <template...>`, with absent values passed as empty strings. The first
/// non-empty line on stdout is the output folder.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    program: String,
    args: Vec<String>,
}

impl ProcessGenerator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line. `None` when blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl CodeGenerator for ProcessGenerator {
    async fn generate(
        &self,
        application: Option<&str>,
        session: Option<&str>,
        templates: &[String],
    ) -> Result<PathBuf, GenerationError> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(application.unwrap_or_default())
            .arg(session.unwrap_or_default())
            .args(templates)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| GenerationError::EngineFailed {
                reason: format!("Failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(GenerationError::EngineFailed { reason });
        }

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| GenerationError::EngineFailed {
                reason: format!("{} reported no output path", self.program),
            })
    }
}
