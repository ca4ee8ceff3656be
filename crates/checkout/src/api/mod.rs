//! External collaborators of the checkout flow.
//!
//! Two services exist behind traits so tests can substitute recording fakes:
//! the order API (creation, partial updates, profile) and the payment relay
//! (provider checkout sessions). The HTTP implementations live in [`http`].
//!
//! Wire payloads use camelCase keys; money travels as decimal strings, the
//! way the order API serializes it.

pub mod http;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lapacho_core::{
    Contact, Delivery, Order, OrderId, PaymentMethod, PaymentStatus, PreferenceId, ProductId,
    VariantId,
};

use crate::error::CheckoutError;
use crate::normalize::ContactPrefill;
use crate::session::AuthSession;

/// One line of an order creation request, priced from the cart snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// `POST /orders` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub contact: Contact,
    pub delivery: Delivery,
    pub notes: String,
    pub total: Decimal,
}

/// `PATCH /orders/{id}` request body. Every field optional; absent fields
/// are left untouched by the server.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

/// One display line of a provider checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Buyer identity forwarded to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payer {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
}

/// `POST /payments/checkout-session` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub order_id: OrderId,
    pub items: Vec<SessionItem>,
    pub payer: Payer,
    pub return_url: String,
}

/// A provider checkout handle: where to send the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub preference_id: PreferenceId,
    pub redirect_url: String,
}

/// The order API: creation, partial updates, and the authenticated profile.
#[allow(async_fn_in_trait)]
pub trait OrderApi {
    /// Create an order. The idempotency key makes retries after a network
    /// failure safe: the server deduplicates on it.
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: Uuid,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError>;

    /// Partially update an existing order. Never creates one.
    async fn update_order(
        &self,
        id: OrderId,
        patch: &OrderPatch,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError>;

    /// Fetch the authenticated user's profile for contact prefill.
    async fn fetch_profile(&self, session: &AuthSession) -> Result<ContactPrefill, CheckoutError>;
}

/// The payment relay: provider checkout sessions.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Request a provider checkout session scoped to an order and amount.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapacho_core::{DeliveryMethod, Email};

    #[test]
    fn create_order_request_serializes_camel_case() {
        let request = CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id: ProductId::new(1),
                variant_id: Some(VariantId::new(4)),
                quantity: 2,
                unit_price: Decimal::from(2500),
            }],
            contact: Contact {
                name: "Ana".to_owned(),
                surname: "Gómez".to_owned(),
                phone: "362-400-0000".to_owned(),
                email: Email::parse("ana@example.com").unwrap(),
            },
            delivery: Delivery::for_method(DeliveryMethod::Pickup, None, None),
            notes: String::new(),
            total: Decimal::from(5000),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["items"][0]["productId"], 1);
        assert_eq!(json["items"][0]["variantId"], 4);
        assert!(json["items"][0]["unitPrice"].is_string());
        assert_eq!(json["delivery"]["method"], "pickup");
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = OrderPatch {
            payment_status: Some(PaymentStatus::Paid),
            ..OrderPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["paymentStatus"], "paid");
        assert!(json.get("total").is_none());
        assert!(json.get("delivery").is_none());
    }

    #[test]
    fn checkout_session_round_trips() {
        let raw = r#"{"preferenceId": "pref-1", "redirectUrl": "https://pay.example/p/1"}"#;
        let session: CheckoutSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.preference_id, PreferenceId::new("pref-1"));
    }
}
