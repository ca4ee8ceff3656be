//! Reqwest-backed implementations of the API traits.
//!
//! Both clients bound every call with the configured timeout; an elapsed
//! timeout surfaces as [`CheckoutError::Network`] rather than hanging the
//! flow.

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use lapacho_core::{Order, OrderId};

use crate::api::{
    CheckoutSession, CheckoutSessionRequest, CreateOrderRequest, OrderApi, OrderPatch,
    PaymentGateway,
};
use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::normalize::{self, ContactPrefill};
use crate::session::AuthSession;

/// Idempotency key header on order creation.
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

fn build_client(config: &CheckoutConfig) -> Result<reqwest::Client, CheckoutError> {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()?)
}

fn base(url: &url::Url) -> String {
    url.as_str().trim_end_matches('/').to_owned()
}

/// HTTP client for the order API.
#[derive(Debug, Clone)]
pub struct HttpOrderApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderApi {
    /// Create a client for the configured order API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CheckoutConfig) -> Result<Self, CheckoutError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: base(&config.order_api_base_url),
        })
    }

    /// Map a non-success order API response onto the error taxonomy.
    async fn rejection(response: Response) -> CheckoutError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return CheckoutError::AuthRequired;
        }

        // The server puts its human-readable message under "detail"; show it
        // verbatim, falling back to the raw body.
        let message = match response.json::<Value>().await {
            Ok(body) => body
                .get("detail")
                .and_then(Value::as_str)
                .map_or_else(|| body.to_string(), str::to_owned),
            Err(_) => "order API returned an unreadable error".to_owned(),
        };

        CheckoutError::ServerRejection {
            status: status.as_u16(),
            message,
        }
    }
}

impl OrderApi for HttpOrderApi {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: Uuid,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/orders", self.base_url))
            .header("Authorization", session.bearer())
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: Value = response.json().await?;
        normalize::order(&body)
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: &OrderPatch,
        session: &AuthSession,
    ) -> Result<Order, CheckoutError> {
        let response = self
            .client
            .patch(format!("{}/orders/{id}", self.base_url))
            .header("Authorization", session.bearer())
            .json(patch)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: Value = response.json().await?;
        normalize::order(&body)
    }

    async fn fetch_profile(&self, session: &AuthSession) -> Result<ContactPrefill, CheckoutError> {
        let response = self
            .client
            .get(format!("{}/auth/me", self.base_url))
            .header("Authorization", session.bearer())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: Value = response.json().await?;
        Ok(normalize::profile(&body))
    }
}

/// HTTP client for the payment relay.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Create a client for the configured payment relay.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &CheckoutConfig) -> Result<Self, CheckoutError> {
        Ok(Self {
            client: build_client(config)?,
            base_url: base(&config.relay_base_url),
        })
    }
}

impl PaymentGateway for HttpPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, CheckoutError> {
        let response = self
            .client
            .post(format!("{}/payments/checkout-session", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Provider(format!(
                "relay returned {status}: {message}"
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|err| CheckoutError::InvalidResponse(err.to_string()))?;

        if session.redirect_url.is_empty() {
            return Err(CheckoutError::Provider(
                "no redirect URL received".to_owned(),
            ));
        }

        Ok(session)
    }
}
