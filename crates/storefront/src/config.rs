//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_ORDER_PHONE` - WhatsApp number receiving checkout messages
//!   (international format, digits only; `+`, spaces and dashes are stripped)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `STOREFRONT_CATALOG_PATH` - Product catalog JSON
//!   (default: `crates/storefront/content/products.json`)
//! - `STOREFRONT_STATIC_DIR` - Static assets directory
//!   (default: `crates/storefront/static`)
//! - `STOREFRONT_SESSION_DATABASE_URL` - `SQLite` database holding visitor
//!   sessions and their carts (default: `sqlite://masala-sessions.db`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use masala_core::cart::order;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Checkout phone number, digits only
    pub order_phone: String,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Static assets directory served under `/static`
    pub static_dir: PathBuf,
    /// `SQLite` URL of the session database
    pub session_database_url: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

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
        let base_url = validate_base_url(
            &get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000"),
            "STOREFRONT_BASE_URL",
        )?;
        let order_phone =
            normalize_phone(&get_required_env("STOREFRONT_ORDER_PHONE")?, "STOREFRONT_ORDER_PHONE")?;
        let catalog_path = PathBuf::from(get_env_or_default(
            "STOREFRONT_CATALOG_PATH",
            "crates/storefront/content/products.json",
        ));
        let static_dir = PathBuf::from(get_env_or_default(
            "STOREFRONT_STATIC_DIR",
            "crates/storefront/static",
        ));

        let session_database_url = validate_sqlite_url(
            &get_env_or_default("STOREFRONT_SESSION_DATABASE_URL", "sqlite://masala-sessions.db"),
            "STOREFRONT_SESSION_DATABASE_URL",
        )?;

        Ok(Self {
            host,
            port,
            base_url,
            order_phone,
            catalog_path,
            static_dir,
            session_database_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_rate(&raw, key)
}

fn parse_rate(raw: &str, var_name: &str) -> Result<f32, ConfigError> {
    let rate = raw
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Validate that the base URL is an absolute http(s) URL.
fn validate_base_url(raw: &str, var_name: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Only `SQLite` URLs are supported for the session database.
fn validate_sqlite_url(raw: &str, var_name: &str) -> Result<String, ConfigError> {
    if !raw.starts_with("sqlite:") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be a sqlite: URL".to_string(),
        ));
    }
    Ok(raw.to_string())
}

/// Validate the checkout phone number, keeping only its digits.
fn normalize_phone(raw: &str, var_name: &str) -> Result<String, ConfigError> {
    order::normalize_phone(raw)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            order_phone: "919876543210".to_string(),
            catalog_path: PathBuf::from("content/products.json"),
            static_dir: PathBuf::from("static"),
            session_database_url: "sqlite::memory:".to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_normalize_phone_strips_formatting() {
        let phone = normalize_phone("+91 98765-43210", "TEST_PHONE").unwrap();
        assert_eq!(phone, "919876543210");
    }

    #[test]
    fn test_normalize_phone_rejects_letters() {
        let result = normalize_phone("YOUR_PHONE_NUMBER", "TEST_PHONE");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_normalize_phone_rejects_bad_length() {
        assert!(normalize_phone("12345", "TEST_PHONE").is_err());
        assert!(normalize_phone("1234567890123456", "TEST_PHONE").is_err());
    }

    #[test]
    fn test_validate_base_url() {
        assert_eq!(
            validate_base_url("https://masala.example/", "TEST_URL").unwrap(),
            "https://masala.example"
        );
        assert!(validate_base_url("ftp://masala.example", "TEST_URL").is_err());
        assert!(validate_base_url("not a url", "TEST_URL").is_err());
    }

    #[test]
    fn test_validate_sqlite_url() {
        assert!(validate_sqlite_url("sqlite://masala-sessions.db", "TEST_DB").is_ok());
        assert!(validate_sqlite_url("sqlite::memory:", "TEST_DB").is_ok());
        assert!(validate_sqlite_url("postgres://localhost/masala", "TEST_DB").is_err());
    }

    #[test]
    fn test_parse_rate_bounds() {
        assert!((parse_rate("0.25", "TEST_RATE").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_rate("1.5", "TEST_RATE").is_err());
        assert!(parse_rate("lots", "TEST_RATE").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        let mut config = config();
        assert!(!config.is_secure());
        config.base_url = "https://masala.example".to_string();
        assert!(config.is_secure());
    }
}
