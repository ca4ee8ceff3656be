//! Checkout client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LAPACHO_ORDER_API_URL` - Base URL of the order API
//! - `LAPACHO_RELAY_URL` - Base URL of the payment relay service
//! - `LAPACHO_RETURN_URL` - Public URL the provider redirects back to
//!
//! ## Optional
//! - `LAPACHO_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 10)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default bound on any single network call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout client configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the order API.
    pub order_api_base_url: Url,
    /// Base URL of the payment relay service.
    pub relay_base_url: Url,
    /// Public URL the payment provider redirects back to.
    pub return_url: Url,
    /// Bound on any single network call.
    pub request_timeout: Duration,
}

impl CheckoutConfig {
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

        let order_api_base_url = required_url("LAPACHO_ORDER_API_URL")?;
        let relay_base_url = required_url("LAPACHO_RELAY_URL")?;
        let return_url = required_url("LAPACHO_RETURN_URL")?;

        let request_timeout = match std::env::var("LAPACHO_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar(
                        "LAPACHO_HTTP_TIMEOUT_SECS".to_owned(),
                        format!("not a number: {raw}"),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            order_api_base_url,
            relay_base_url,
            return_url,
            request_timeout,
        })
    }
}

fn required_url(name: &str) -> Result<Url, ConfigError> {
    let raw =
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))?;
    Url::parse(&raw).map_err(|err| ConfigError::InvalidEnvVar(name.to_owned(), err.to_string()))
}
