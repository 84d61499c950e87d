//! Tracing Subscriber Initialization
//!
//! Log level comes from `RUST_LOG`; output format from `APPFORGE_LOG_FORMAT`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "appforge_api=debug,appforge_storage=debug,tower_http=info,info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Human-readable multi-line output
    Pretty,
    /// Human-readable single-line output
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Output format
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl TelemetryConfig {
    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment =
            lookup("APPFORGE_ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        // JSON in deployed environments, readable output locally.
        let log_format = lookup("APPFORGE_LOG_FORMAT")
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or(if environment == "development" {
                LogFormat::Pretty
            } else {
                LogFormat::Json
            });

        Self {
            service_name: lookup("APPFORGE_SERVICE_NAME")
                .unwrap_or_else(|| "appforge-api".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment,
            log_format,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup, before anything logs. A second call fails.
pub fn init_tracer(config: &TelemetryConfig) -> ApiResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (json, pretty, compact) = match config.log_format {
        LogFormat::Json => (Some(fmt::layer().json()), None, None),
        LogFormat::Pretty => (None, Some(fmt::layer().pretty()), None),
        LogFormat::Compact => (None, None, Some(fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(pretty)
        .with(compact)
        .try_init()
        .map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        log_format = ?config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}
