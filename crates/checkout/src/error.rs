//! Unified checkout error taxonomy.
//!
//! Every variant except [`CheckoutError::InvalidResponse`] is recoverable:
//! the caller re-prompts, retries, or redirects. `InvalidResponse` means a
//! collaborator returned something structurally unusable (e.g. a created
//! order with no id) and the flow must abort rather than proceed with an
//! invalid order reference.

use lapacho_core::PaymentStatus;
use thiserror::Error;

/// Errors surfaced by the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No items to check out; the caller should redirect to the cart view.
    #[error("cart is empty")]
    EmptyCart,

    /// Required contact or address fields are missing.
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// No session token; the caller should redirect to login.
    #[error("authentication required")]
    AuthRequired,

    /// A request failed to complete. Nothing can be assumed about whether
    /// the server acted on it; retries reuse the same idempotency key.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The payment provider rejected or errored; the buyer can switch
    /// payment methods.
    #[error("payment provider error: {0}")]
    Provider(String),

    /// The order API returned a 4xx/5xx with a message, shown verbatim.
    #[error("order API rejected the request ({status}): {message}")]
    ServerRejection { status: u16, message: String },

    /// A response payload failed structural validation. Fatal for the flow.
    #[error("structurally invalid response: {0}")]
    InvalidResponse(String),

    /// A creation request for this flow is already in flight; re-entry is
    /// refused until it settles.
    #[error("a request for this flow is already in flight")]
    RequestInFlight,

    /// This completion was superseded by a newer request or a flow reset and
    /// was discarded without touching local state.
    #[error("superseded by a newer request")]
    Superseded,

    /// No order has been created in this flow yet.
    #[error("no active order in this flow")]
    NoActiveOrder,

    /// The order's payment status is terminal; no further changes allowed.
    #[error("order is already {0}; no further changes are allowed")]
    OrderFinalized(PaymentStatus),

    /// Reading or writing the persisted cart failed.
    #[error("cart store error: {0}")]
    Store(#[from] crate::store::StoreError),
}

impl CheckoutError {
    /// Whether the flow must abort rather than recover.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_missing_fields() {
        let err = CheckoutError::Validation(vec!["address".to_owned(), "city".to_owned()]);
        assert_eq!(err.to_string(), "missing required fields: address, city");
    }

    #[test]
    fn only_invalid_response_is_fatal() {
        assert!(CheckoutError::InvalidResponse("no id".to_owned()).is_fatal());
        assert!(!CheckoutError::EmptyCart.is_fatal());
        assert!(!CheckoutError::AuthRequired.is_fatal());
        assert!(
            !CheckoutError::ServerRejection {
                status: 400,
                message: "insufficient stock".to_owned()
            }
            .is_fatal()
        );
    }

    #[test]
    fn server_rejection_carries_the_verbatim_message() {
        let err = CheckoutError::ServerRejection {
            status: 409,
            message: "producto sin stock".to_owned(),
        };
        assert!(err.to_string().contains("producto sin stock"));
    }
}
