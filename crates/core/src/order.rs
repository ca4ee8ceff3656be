//! Persisted orders and the payment status state machine.
//!
//! An [`Order`] is the server-side record created from a cart. Its line items
//! are denormalized copies of the cart lines at creation time. Once the
//! payment status reaches a terminal state the order is immutable from the
//! client's point of view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    DeliveryMethod, Email, OrderId, PaymentId, PaymentMethod, PaymentStatus, ProductId, VariantId,
};

/// Contact details attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub email: Email,
}

/// Delivery selection: method, cost, and address when shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub method: DeliveryMethod,
    pub cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl Delivery {
    /// Delivery with the method's standard cost.
    #[must_use]
    pub fn for_method(method: DeliveryMethod, address: Option<String>, city: Option<String>) -> Self {
        Self {
            method,
            cost: method.cost(),
            address,
            city,
        }
    }
}

/// A denormalized order line, priced from the cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    /// Variant size label, when the line has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Variant color label, when the line has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub items: Vec<OrderLine>,
    pub contact: Contact,
    pub delivery: Delivery,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Attempted transition out of a terminal payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payment status is terminal ({from}), cannot transition to {to}")]
pub struct TransitionError {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
}

impl Order {
    /// Sum of line subtotals, before shipping.
    #[must_use]
    pub fn items_subtotal(&self) -> Decimal {
        self.items.iter().map(|line| line.subtotal).sum()
    }

    /// The total this order should carry: line subtotals plus delivery cost.
    #[must_use]
    pub fn expected_total(&self) -> Decimal {
        self.items_subtotal() + self.delivery.cost
    }

    /// Whether the stored total matches the recomputed one.
    #[must_use]
    pub fn total_is_consistent(&self) -> bool {
        self.total == self.expected_total()
    }

    /// Apply a payment status transition, enforcing forward-only movement.
    ///
    /// A `Pending -> Pending` transition is accepted as a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] when the current status is terminal.
    pub fn apply_payment_status(&mut self, next: PaymentStatus) -> Result<(), TransitionError> {
        if !self.payment_status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.payment_status,
                to: next,
            });
        }
        self.payment_status = next;
        Ok(())
    }

    /// Recompute delivery cost and total for a new delivery method.
    ///
    /// Address fields are kept; they are simply unused for pickup.
    pub fn set_delivery_method(&mut self, method: DeliveryMethod) {
        self.delivery.method = method;
        self.delivery.cost = method.cost();
        self.total = self.expected_total();
    }
}

/// One payment attempt against an order.
///
/// An order may accumulate several attempts when earlier ones failed; only
/// the latest is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub method: PaymentMethod,
}
