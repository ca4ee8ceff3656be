//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RELAY_PROVIDER_URL` - Payment provider API base URL
//! - `RELAY_PROVIDER_TOKEN` - Provider access token
//! - `RELAY_ORDER_API_URL` - Order API base URL
//! - `RELAY_ORDER_API_TOKEN` - Service token for server-to-server confirmations
//!
//! ## Optional
//! - `RELAY_HOST` - Bind address (default: 127.0.0.1)
//! - `RELAY_PORT` - Listen port (default: 3001)
//! - `RELAY_PUBLIC_URL` - Public base URL of this relay, registered with the
//!   provider as the webhook callback
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
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

/// Relay application configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Payment provider API base URL.
    pub provider_base_url: Url,
    /// Provider access token.
    pub provider_token: SecretString,
    /// Order API base URL.
    pub order_api_base_url: Url,
    /// Service token for server-to-server order confirmations.
    pub order_api_token: SecretString,
    /// Public base URL of this relay, for provider webhook callbacks.
    pub public_base_url: Option<Url>,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag.
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("provider_base_url", &self.provider_base_url.as_str())
            .field("provider_token", &"[REDACTED]")
            .field("order_api_base_url", &self.order_api_base_url.as_str())
            .field("order_api_token", &"[REDACTED]")
            .field(
                "public_base_url",
                &self.public_base_url.as_ref().map(Url::as_str),
            )
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = match std::env::var("RELAY_HOST") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("RELAY_HOST".to_owned(), format!("not an IP: {raw}"))
            })?,
            Err(_) => IpAddr::from([127, 0, 0, 1]),
        };
        let port = match std::env::var("RELAY_PORT") {
            Ok(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("RELAY_PORT".to_owned(), format!("not a port: {raw}"))
            })?,
            Err(_) => 3001,
        };

        Ok(Self {
            host,
            port,
            provider_base_url: required_url("RELAY_PROVIDER_URL")?,
            provider_token: required_secret("RELAY_PROVIDER_TOKEN")?,
            order_api_base_url: required_url("RELAY_ORDER_API_URL")?,
            order_api_token: required_secret("RELAY_ORDER_API_TOKEN")?,
            public_base_url: optional_url("RELAY_PUBLIC_URL")?,
            sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            sentry_environment: std::env::var("SENTRY_ENVIRONMENT").ok(),
        })
    }

    /// The socket address to bind.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required_url(name: &str) -> Result<Url, ConfigError> {
    let raw =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))?;
    Url::parse(&raw).map_err(|err| ConfigError::InvalidEnvVar(name.to_owned(), err.to_string()))
}

fn optional_url(name: &str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => Url::parse(&raw)
            .map(Some)
            .map_err(|err| ConfigError::InvalidEnvVar(name.to_owned(), err.to_string())),
        Err(_) => Ok(None),
    }
}

fn required_secret(name: &str) -> Result<SecretString, ConfigError> {
    let raw =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))?;
    validate_secret(name, &raw)?;
    Ok(SecretString::from(raw))
}

fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            "value is empty".to_owned(),
        ));
    }
    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_owned(),
                format!("looks like a placeholder ({pattern})"),
            ));
        }
    }
    Ok(())
}

/// Expose a secret for use in an `Authorization` header.
pub(crate) fn bearer(secret: &SecretString) -> String {
    format!("Bearer {}", secret.expose_secret())
}
