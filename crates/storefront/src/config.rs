//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for the session store
//!   (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `API_BASE_URL` - Base URL of the business REST API
//! - `WOMPI_PUBLIC_KEY` - Wompi public key used by the checkout widget
//! - `WOMPI_INTEGRITY_SECRET` - Wompi integrity secret for signing checkouts
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `WOMPI_ENV` - `sandbox` or `production` (default: sandbox)
//! - `WOMPI_CURRENCY` - Checkout currency (default: COP)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use climatech_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Base URL of the business REST API (no trailing slash)
    pub api_base_url: String,
    /// Wompi payment configuration
    pub wompi: WompiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 - 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 - 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Wompi environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WompiEnv {
    #[default]
    Sandbox,
    Production,
}

impl WompiEnv {
    /// Base URL of the Wompi REST API.
    #[must_use]
    pub const fn api_base(&self) -> &'static str {
        match self {
            Self::Sandbox => "https://sandbox.wompi.co/v1",
            Self::Production => "https://production.wompi.co/v1",
        }
    }
}

impl std::str::FromStr for WompiEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" | "test" => Ok(Self::Sandbox),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected sandbox or production, got {other}")),
        }
    }
}

/// Wompi checkout configuration.
///
/// Implements `Debug` manually to redact the integrity secret.
#[derive(Clone)]
pub struct WompiConfig {
    /// Public key passed to the widget (safe to expose in the browser)
    pub public_key: String,
    /// Integrity secret used to sign checkout parameters (server-side only)
    pub integrity_secret: SecretString,
    pub env: WompiEnv,
    pub currency: CurrencyCode,
    /// Overrides the Wompi API base (tests point this at a local server)
    pub api_base_override: Option<String>,
}

impl WompiConfig {
    /// Wompi REST API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_base_override
            .as_deref()
            .unwrap_or_else(|| self.env.api_base())
    }
}

impl std::fmt::Debug for WompiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WompiConfig")
            .field("public_key", &self.public_key)
            .field("integrity_secret", &"[REDACTED]")
            .field("env", &self.env)
            .field("currency", &self.currency)
            .field("api_base_override", &self.api_base_override)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        let api_base_url = get_api_base_url()?;
        let wompi = WompiConfig::from_env()?;

        let sentry_sample_rate = get_rate("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            api_base_url,
            wompi,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL Wompi redirects to after payment.
    #[must_use]
    pub fn checkout_result_url(&self) -> String {
        format!("{}/checkout/result", self.base_url.trim_end_matches('/'))
    }
}

impl WompiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let env = get_env_or_default("WOMPI_ENV", "sandbox")
            .parse::<WompiEnv>()
            .map_err(|e| ConfigError::InvalidEnvVar("WOMPI_ENV".to_string(), e))?;
        let currency = get_env_or_default("WOMPI_CURRENCY", "COP")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("WOMPI_CURRENCY".to_string(), e))?;

        Ok(Self {
            public_key: get_required_env("WOMPI_PUBLIC_KEY")?,
            integrity_secret: get_validated_secret("WOMPI_INTEGRITY_SECRET")?,
            env,
            currency,
            api_base_override: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Read `API_BASE_URL`, validate it and strip the trailing slash.
fn get_api_base_url() -> Result<String, ConfigError> {
    let raw = get_required_env("API_BASE_URL")?;
    normalize_base_url(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e))
}

fn normalize_base_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", parsed.scheme()));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn wompi() -> WompiConfig {
        WompiConfig {
            public_key: "pub_test_Q5yDA9xoKdePzhSGeVe9HAez7HgGORGf".to_string(),
            integrity_secret: SecretString::from("test_integrity_Z5mMke9x0k8gpErbDqwrJXMqs"),
            env: WompiEnv::Sandbox,
            currency: CurrencyCode::COP,
            api_base_override: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-integrity-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("test_integrity_Z5mMke9x0k8gpErbDqwrJXMqs", "TEST").is_ok());
    }

    #[test]
    fn test_wompi_env_parse_and_base() {
        assert_eq!("Production".parse::<WompiEnv>(), Ok(WompiEnv::Production));
        assert_eq!(WompiEnv::default().api_base(), "https://sandbox.wompi.co/v1");
        assert!("staging".parse::<WompiEnv>().is_err());
    }

    #[test]
    fn test_wompi_api_base_override() {
        let mut config = wompi();
        assert_eq!(config.api_base(), "https://sandbox.wompi.co/v1");
        config.api_base_override = Some("http://127.0.0.1:9999".to_string());
        assert_eq!(config.api_base(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.climatech.co/").unwrap(),
            "https://api.climatech.co"
        );
        assert!(normalize_base_url("ftp://api.climatech.co").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_socket_addr_and_result_url() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://climatech.co/".to_string(),
            api_base_url: "https://api.climatech.co".to_string(),
            wompi: wompi(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert_eq!(
            config.checkout_result_url(),
            "https://climatech.co/checkout/result"
        );
    }

    #[test]
    fn test_wompi_config_debug_redacts_secret() {
        let debug_output = format!("{:?}", wompi());
        assert!(debug_output.contains("pub_test_Q5yDA9xoKdePzhSGeVe9HAez7HgGORGf"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("Z5mMke9x0k8gpErbDqwrJXMqs"));
    }
}
