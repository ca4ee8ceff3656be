//! Unified error handling with Sentry integration.
//!
//! Provides a unified `RelayError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, RelayError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::provider::ProviderError;

/// Application-level error type for the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Payment provider operation failed.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Order API call failed during confirmation.
    #[error("Order API error: {0}")]
    OrderApi(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Provider(_) | Self::OrderApi(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Provider(_) | Self::OrderApi(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose upstream error details to clients
        let message = match &self {
            Self::Provider(_) => "Payment provider error".to_string(),
            Self::OrderApi(_) => "Order service error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(_) => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `RelayError`.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_display() {
        let err = RelayError::BadRequest("missing order id".to_string());
        assert_eq!(err.to_string(), "Bad request: missing order id");
    }

    #[test]
    fn test_relay_error_status_codes() {
        fn get_status(err: RelayError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(RelayError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RelayError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(RelayError::OrderApi("test".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_client_messages_hide_upstream_detail() {
        let response = RelayError::OrderApi("token leaked?".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
