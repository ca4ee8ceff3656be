//! Server-to-server order confirmation client.
//!
//! After the webhook verifies an approved payment with the provider, the
//! outcome is forwarded to the order API with a service token. The storefront
//! client reconciles the same outcome on redirect; the order API treats
//! whichever arrives first as authoritative and ignores repeats.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use secrecy::SecretString;
use serde::Serialize;
use url::Url;

use lapacho_core::{OrderId, PaymentStatus};

use crate::config::{RelayConfig, bearer};
use crate::error::RelayError;
use crate::provider::ProviderPayment;

/// Payment outcome forwarded to the order API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub order_id: OrderId,
    pub payment_id: i64,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

impl PaymentConfirmation {
    /// Build a confirmation from a verified provider payment.
    ///
    /// Returns `None` when the payment carries no usable order reference.
    #[must_use]
    pub fn from_payment(payment: &ProviderPayment) -> Option<Self> {
        let order_id = payment
            .external_reference
            .as_deref()
            .and_then(|reference| reference.parse::<i64>().ok())
            .map(OrderId::new)?;
        Some(Self {
            order_id,
            payment_id: payment.id,
            status: payment.status.into_payment_status(),
            amount: payment.transaction_amount.and_then(Decimal::from_f64),
        })
    }
}

/// Client that posts payment confirmations to the order API.
#[derive(Clone)]
pub struct OrderConfirmer {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl OrderConfirmer {
    /// Create a new confirmer from the relay configuration.
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.order_api_base_url.clone(),
            token: config.order_api_token.clone(),
        }
    }

    /// Post a payment confirmation to the order API.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::OrderApi` on network failure or rejection.
    pub async fn confirm(&self, confirmation: &PaymentConfirmation) -> Result<(), RelayError> {
        let url = self
            .base_url
            .join("payments/confirm")
            .map_err(|err| RelayError::Internal(format!("bad confirm endpoint: {err}")))?;

        let response = self
            .client
            .post(url)
            .header("Authorization", bearer(&self.token))
            .json(confirmation)
            .send()
            .await
            .map_err(|err| RelayError::OrderApi(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(
                order_id = %confirmation.order_id,
                payment_id = confirmation.payment_id,
                status = ?confirmation.status,
                "Payment confirmation delivered"
            );
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(RelayError::OrderApi(format!(
                "confirmation rejected ({status}): {body}"
            )))
        }
    }
}
