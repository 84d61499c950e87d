//! API Configuration Module
//!
//! Configuration is loaded from `APPFORGE_*` environment variables with
//! defaults suitable for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Runtime configuration for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Root holding template/table indexes, `table/` and `application/`.
    pub data_dir: PathBuf,

    /// Path prefix every resource route is mounted under (e.g. `/api`).
    /// Empty mounts the routes at the root.
    pub api_prefix: String,

    pub bind_host: String,
    /// Raw port value, validated by [`ApiConfig::bind_addr`].
    pub bind_port: String,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Behaviour
    // ========================================================================
    /// Timeout around one engine call. `None` waits indefinitely.
    pub generation_timeout: Option<Duration>,

    /// Require application, session and templates on generation requests.
    pub validate_generation: bool,

    /// Report missing documents as 404 instead of 500.
    pub missing_as_404: bool,

    /// Skip unparsable application files when scanning.
    pub skip_invalid_files: bool,

    /// External code-generation command. `None` disables generation.
    pub generator_cmd: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            api_prefix: "/api".to_string(),
            bind_host: "0.0.0.0".to_string(),
            bind_port: "3000".to_string(),
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            generation_timeout: Some(Duration::from_secs(300)),
            validate_generation: false,
            missing_as_404: false,
            skip_invalid_files: true,
            generator_cmd: None,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `APPFORGE_DATA_DIR`: data root (default: ./data)
    /// - `APPFORGE_API_PREFIX`: route prefix (default: /api)
    /// - `APPFORGE_API_BIND`: listen host (default: 0.0.0.0)
    /// - `PORT` or `APPFORGE_API_PORT`: listen port (default: 3000)
    /// - `APPFORGE_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `APPFORGE_CORS_MAX_AGE_SECS`: preflight cache duration (default: 86400)
    /// - `APPFORGE_GENERATION_TIMEOUT_SECS`: engine timeout, 0 disables (default: 300)
    /// - `APPFORGE_VALIDATE_GENERATION`: "true" or "false" (default: false)
    /// - `APPFORGE_MISSING_AS_404`: "true" or "false" (default: false)
    /// - `APPFORGE_SKIP_INVALID_FILES`: "true" or "false" (default: true)
    /// - `APPFORGE_GENERATOR_CMD`: engine command (default: unset)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|s| matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(default)
        };

        let data_dir = lookup("APPFORGE_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let api_prefix = lookup("APPFORGE_API_PREFIX")
            .map(|s| normalize_prefix(&s))
            .unwrap_or(defaults.api_prefix);

        let bind_host = lookup("APPFORGE_API_BIND").unwrap_or(defaults.bind_host);
        let bind_port = lookup("PORT")
            .or_else(|| lookup("APPFORGE_API_PORT"))
            .unwrap_or(defaults.bind_port);

        let cors_origins = lookup("APPFORGE_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = lookup("APPFORGE_CORS_MAX_AGE_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let generation_timeout = match lookup("APPFORGE_GENERATION_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.generation_timeout,
        };

        let generator_cmd = lookup("APPFORGE_GENERATOR_CMD").filter(|s| !s.trim().is_empty());

        Self {
            data_dir,
            api_prefix,
            bind_host,
            bind_port,
            cors_origins,
            cors_max_age_secs,
            generation_timeout,
            validate_generation: flag("APPFORGE_VALIDATE_GENERATION", defaults.validate_generation),
            missing_as_404: flag("APPFORGE_MISSING_AS_404", defaults.missing_as_404),
            skip_invalid_files: flag("APPFORGE_SKIP_INVALID_FILES", defaults.skip_invalid_files),
            generator_cmd,
        }
    }

    /// Resolve the listen address.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let port = self.bind_port.trim().parse::<u16>().map_err(|_| {
            ApiError::internal_error(format!("Invalid port value: {}", self.bind_port))
        })?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e))
        })
    }
}

/// Leading slash, no trailing slash; `/` and blank become empty.
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
