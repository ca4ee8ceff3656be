//! HTTP routes for the payment relay.
//!
//! Three endpoints:
//!
//! - `POST /payments/checkout-session` creates a provider preference for an
//!   order and hands back the hosted-checkout redirect URL.
//! - `POST /payments/webhook` receives provider notifications, verifies the
//!   payment server-to-server, and confirms approved payments to the order
//!   API.
//! - `GET /health` for load balancer checks.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use lapacho_core::OrderId;

use crate::error::{RelayError, Result};
use crate::orders::PaymentConfirmation;
use crate::provider::{PreferenceItem, PreferencePayer, ProviderError};
use crate::state::AppState;

/// Currency for all preference items. Prices are stored without a currency
/// marker; the shop operates in a single currency.
const CURRENCY_ID: &str = "ARS";

/// Build the relay router with tracing and CORS layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/payments/checkout-session", post(create_checkout_session))
        .route("/payments/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// One display line of a checkout session request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionItem {
    title: String,
    quantity: u32,
    unit_price: Decimal,
}

/// Buyer identity forwarded to the provider.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayer {
    name: String,
    surname: String,
    email: String,
    #[serde(default)]
    #[allow(dead_code)]
    phone: String,
}

/// `POST /payments/checkout-session` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSessionRequest {
    order_id: OrderId,
    items: Vec<SessionItem>,
    payer: SessionPayer,
    return_url: String,
}

/// `POST /payments/checkout-session` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutSessionResponse {
    preference_id: String,
    redirect_url: String,
}

async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutSessionRequest>,
) -> Result<Json<CheckoutSessionResponse>> {
    if request.items.is_empty() {
        return Err(RelayError::BadRequest("no items to charge".to_owned()));
    }

    let items: Vec<PreferenceItem> = request
        .items
        .iter()
        .map(|item| PreferenceItem {
            title: item.title.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            currency_id: CURRENCY_ID.to_owned(),
        })
        .collect();
    let payer = PreferencePayer {
        name: request.payer.name.clone(),
        surname: request.payer.surname.clone(),
        email: request.payer.email.clone(),
    };

    let preference = state
        .provider()
        .create_preference(request.order_id.as_i64(), &items, &payer, &request.return_url)
        .await?;

    let redirect_url = preference
        .redirect_url()
        .ok_or_else(|| {
            RelayError::Provider(ProviderError::Malformed(
                "preference has no redirect URL".to_owned(),
            ))
        })?
        .to_owned();

    tracing::info!(
        order_id = %request.order_id,
        preference_id = %preference.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutSessionResponse {
        preference_id: preference.id,
        redirect_url,
    }))
}

/// Provider notification body. The provider sends several shapes; only the
/// payment id matters, everything else is re-fetched server-to-server.
async fn webhook(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> StatusCode {
    let body = body.map(|Json(value)| value);
    let Some(payment_id) = webhook_payment_id(&query, body.as_ref()) else {
        // Non-payment topics (merchant orders, test pings) are acknowledged
        // and dropped.
        tracing::debug!("Webhook without a payment id ignored");
        return StatusCode::OK;
    };

    let payment = match state.provider().get_payment(payment_id).await {
        Ok(payment) => payment,
        Err(err) => {
            tracing::warn!(payment_id, error = %err, "Webhook payment lookup failed");
            sentry::capture_error(&err);
            return StatusCode::OK;
        }
    };

    // Only an approved result is pushed to the order API; the client
    // reconciles pending and failed outcomes itself on redirect.
    if payment.status != lapacho_core::ProviderPaymentStatus::Approved {
        tracing::debug!(payment_id, status = ?payment.status, "Webhook payment not approved, nothing to confirm");
        return StatusCode::OK;
    }

    let Some(confirmation) = PaymentConfirmation::from_payment(&payment) else {
        tracing::warn!(
            payment_id,
            reference = ?payment.external_reference,
            "Webhook payment has no usable order reference"
        );
        return StatusCode::OK;
    };

    if let Err(err) = state.orders().confirm(&confirmation).await {
        tracing::warn!(payment_id, error = %err, "Payment confirmation failed");
        sentry::capture_error(&err);
    }

    StatusCode::OK
}

/// Extract the payment id from a webhook notification.
///
/// Accepts the query form (`?topic=payment&id=123`, also sent as
/// `type=payment&data.id=123`) and the JSON body form
/// (`{"action": "payment.updated", "data": {"id": "123"}}`). Notifications
/// about other topics yield `None`.
fn webhook_payment_id(query: &HashMap<String, String>, body: Option<&Value>) -> Option<i64> {
    let topic = query
        .get("topic")
        .or_else(|| query.get("type"))
        .map(String::as_str);
    match topic {
        Some("payment") => {
            let raw = query.get("id").or_else(|| query.get("data.id"))?;
            return raw.parse().ok();
        }
        Some(_) => return None,
        None => {}
    }

    let body = body?;
    if let Some(kind) = body.get("type").and_then(Value::as_str)
        && kind != "payment"
    {
        return None;
    }
    if let Some(action) = body.get("action").and_then(Value::as_str)
        && !action.starts_with("payment")
    {
        return None;
    }
    match body.pointer("/data/id") {
        Some(Value::String(raw)) => raw.parse().ok(),
        Some(Value::Number(number)) => number.as_i64(),
        _ => None,
    }
}
