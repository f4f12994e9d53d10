//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `API_BASE_URL` - Base URL of the business REST API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_UPLOAD_MAX_MB` - Largest accepted upload (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sampling in `0.0..=1.0`

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the admin panel (decides the `Secure` cookie flag)
    pub base_url: String,
    /// Business REST API base URL, without trailing slash
    pub api_base_url: String,
    /// Largest upload forwarded to the backend, in bytes
    pub upload_max_bytes: usize,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = parse_env("ADMIN_HOST", "127.0.0.1")?;
        let port = parse_env("ADMIN_PORT", "3001")?;
        let upload_max_mb: usize = parse_env("ADMIN_UPLOAD_MAX_MB", "10")?;

        let api_base_url = normalize_base_url(&get_required_env("API_BASE_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e))?;

        Ok(Self {
            database_url: get_database_url("ADMIN_DATABASE_URL")?,
            host,
            port,
            base_url: get_required_env("ADMIN_BASE_URL")?,
            api_base_url,
            upload_max_bytes: upload_max_mb.saturating_mul(1024 * 1024),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the panel is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn normalize_base_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", parsed.scheme()));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let rate = get_optional_env(key).map_or(Ok(default), |raw| {
        raw.parse::<f32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/admin"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: base_url.to_string(),
            api_base_url: "http://127.0.0.1:4000".to_string(),
            upload_max_bytes: 10 * 1024 * 1024,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_socket_addr() {
        assert_eq!(
            config("http://localhost:3001").socket_addr().to_string(),
            "127.0.0.1:3001"
        );
    }

    #[test]
    fn test_is_secure() {
        assert!(config("https://admin.climatech.co").is_secure());
        assert!(!config("http://localhost:3001").is_secure());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(" http://127.0.0.1:4000/ ").unwrap(),
            "http://127.0.0.1:4000"
        );
        assert!(normalize_base_url("mailto:ops@climatech.co").is_err());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let debug = format!("{:?}", config("http://localhost:3001"));
        assert!(!debug.contains("postgres://localhost/admin"));
    }
}
