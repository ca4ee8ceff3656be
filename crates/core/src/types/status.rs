//! Status and method enums for orders and payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat shipping rate for home delivery, in pesos.
pub const SHIPPING_FLAT_RATE: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);

/// Payment status of an order, as tracked by the order API.
///
/// Transitions only move forward: `Pending -> Paid` or `Pending -> Failed`.
/// `Paid` and `Failed` are terminal; nothing the client does moves an order
/// out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    /// Whether this status accepts no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Failed)
    }

    /// Whether a transition from `self` to `next` is permitted.
    ///
    /// `Pending -> Pending` is allowed as a no-op so that a provider result
    /// of "still processing" can be applied without special-casing.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Pending, _))
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Paid => write!(f, "paid"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How the order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Home delivery; requires an address and carries the flat shipping rate.
    #[default]
    Ship,
    /// In-store pickup; free, no address.
    Pickup,
}

impl DeliveryMethod {
    /// Shipping cost for this method.
    #[must_use]
    pub const fn cost(self) -> Decimal {
        match self {
            Self::Ship => SHIPPING_FLAT_RATE,
            Self::Pickup => Decimal::ZERO,
        }
    }

    /// Whether this method requires a delivery address.
    #[must_use]
    pub const fn requires_address(self) -> bool {
        matches!(self, Self::Ship)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ship => write!(f, "ship"),
            Self::Pickup => write!(f, "pickup"),
        }
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ship" => Ok(Self::Ship),
            "pickup" => Ok(Self::Pickup),
            _ => Err(format!("invalid delivery method: {s}")),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Provider-redirect checkout; the buyer pays on the provider's site.
    Gateway,
    /// Deferred payment in cash, settled at delivery or pickup.
    Cash,
}

/// Payment status as reported by the payment provider.
///
/// This is the provider's vocabulary, not ours; [`Self::into_payment_status`]
/// maps it onto [`PaymentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    /// Any status value this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl ProviderPaymentStatus {
    /// Map a provider status onto the order's payment status.
    ///
    /// `approved` is the only path to `Paid`; both `pending` and `in_process`
    /// stay `Pending`; everything else, including unknown values, is treated
    /// as a failure.
    #[must_use]
    pub const fn into_payment_status(self) -> PaymentStatus {
        match self {
            Self::Approved => PaymentStatus::Paid,
            Self::Pending | Self::InProcess => PaymentStatus::Pending,
            Self::Rejected | Self::Cancelled | Self::Unknown => PaymentStatus::Failed,
        }
    }
}

/// Which of the two independent sessions a token belongs to.
///
/// Client and admin sessions are tracked separately; an operation always
/// receives the role-appropriate session explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Client,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_accept_no_transitions() {
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid));
    }

    #[test]
    fn pending_transitions_forward_or_stays() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn provider_status_maps_to_order_status() {
        assert_eq!(
            ProviderPaymentStatus::Approved.into_payment_status(),
            PaymentStatus::Paid
        );
        assert_eq!(
            ProviderPaymentStatus::Pending.into_payment_status(),
            PaymentStatus::Pending
        );
        assert_eq!(
            ProviderPaymentStatus::InProcess.into_payment_status(),
            PaymentStatus::Pending
        );
        assert_eq!(
            ProviderPaymentStatus::Rejected.into_payment_status(),
            PaymentStatus::Failed
        );
        assert_eq!(
            ProviderPaymentStatus::Unknown.into_payment_status(),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn unknown_provider_statuses_deserialize_to_unknown() {
        let status: ProviderPaymentStatus =
            serde_json::from_str("\"charged_back\"").unwrap();
        assert_eq!(status, ProviderPaymentStatus::Unknown);
    }

    #[test]
    fn delivery_method_costs() {
        assert_eq!(DeliveryMethod::Ship.cost(), Decimal::from(2000));
        assert_eq!(DeliveryMethod::Pickup.cost(), Decimal::ZERO);
        assert!(DeliveryMethod::Ship.requires_address());
        assert!(!DeliveryMethod::Pickup.requires_address());
    }

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Paid).unwrap(),
            "\"paid\""
        );
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::Pickup).unwrap(),
            "\"pickup\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cash).unwrap(),
            "\"cash\""
        );
    }
}
