//! HTTP client for the payment provider's REST API.
//!
//! Two calls are needed for the checkout flow:
//!
//! - `create_preference` registers a checkout preference and returns the
//!   hosted-checkout redirect URL.
//! - `get_payment` fetches a payment by id, used by the webhook handler to
//!   verify status server-to-server instead of trusting the notification body.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use lapacho_core::ProviderPaymentStatus;

use crate::config::{RelayConfig, bearer};

/// Errors that can occur when interacting with the payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the request.
    #[error("Provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Provider returned a response missing required fields.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// A line item in a checkout preference.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub currency_id: String,
}

/// Buyer details forwarded to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencePayer {
    pub name: String,
    pub surname: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
struct BackUrls {
    success: String,
    failure: String,
    pending: String,
}

#[derive(Debug, Serialize)]
struct PreferenceRequest<'a> {
    items: &'a [PreferenceItem],
    payer: &'a PreferencePayer,
    external_reference: String,
    back_urls: BackUrls,
    auto_return: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<String>,
}

/// A created checkout preference.
#[derive(Debug, Clone, Deserialize)]
pub struct Preference {
    pub id: String,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

impl Preference {
    /// The redirect URL the shopper should be sent to.
    ///
    /// Production `init_point` wins; sandbox is the fallback for test
    /// credentials, which only return the sandbox URL.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        self.init_point
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| self.sandbox_init_point.as_deref().filter(|url| !url.is_empty()))
    }
}

/// A payment fetched from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderPayment {
    pub id: i64,
    pub status: ProviderPaymentStatus,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// Client for the payment provider's REST API.
#[derive(Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: Url,
    token: SecretString,
    notification_url: Option<String>,
}

impl ProviderClient {
    /// Create a new provider client from the relay configuration.
    ///
    /// When the relay has a public base URL configured, preferences carry a
    /// `notification_url` pointing at the webhook endpoint so the provider
    /// notifies this instance directly.
    #[must_use]
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.provider_base_url.clone(),
            token: config.provider_token.clone(),
            notification_url: config
                .public_base_url
                .as_ref()
                .and_then(|base| base.join("payments/webhook").ok())
                .map(String::from),
        }
    }

    /// Register a checkout preference and return its id and redirect URLs.
    ///
    /// The order id travels as `external_reference` so the webhook can tie
    /// the eventual payment back to the order. All back URLs point at the
    /// storefront's return URL; the provider appends its own status query
    /// parameters on redirect.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failure, a non-success status, or
    /// a response missing the preference id.
    pub async fn create_preference(
        &self,
        order_id: i64,
        items: &[PreferenceItem],
        payer: &PreferencePayer,
        return_url: &str,
    ) -> Result<Preference, ProviderError> {
        let url = self.endpoint("checkout/preferences")?;
        let body = PreferenceRequest {
            items,
            payer,
            external_reference: order_id.to_string(),
            back_urls: BackUrls {
                success: return_url.to_owned(),
                failure: return_url.to_owned(),
                pending: return_url.to_owned(),
            },
            auto_return: "approved",
            notification_url: self.notification_url.clone(),
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", bearer(&self.token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let preference: Preference = response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;
        if preference.id.is_empty() {
            return Err(ProviderError::Malformed(
                "preference response has no id".to_owned(),
            ));
        }
        Ok(preference)
    }

    /// Fetch a payment by id.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failure, a non-success status, or
    /// an unparseable payment body.
    pub async fn get_payment(&self, payment_id: i64) -> Result<ProviderPayment, ProviderError> {
        let url = self.endpoint(&format!("v1/payments/{payment_id}"))?;
        let response = self
            .client
            .get(url)
            .header("Authorization", bearer(&self.token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|err| ProviderError::Malformed(err.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|err| ProviderError::Malformed(format!("bad endpoint {path}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_url_prefers_production_init_point() {
        let preference = Preference {
            id: "pref-1".to_string(),
            init_point: Some("https://pay.test/live".to_string()),
            sandbox_init_point: Some("https://pay.test/sandbox".to_string()),
        };
        assert_eq!(preference.redirect_url(), Some("https://pay.test/live"));
    }

    #[test]
    fn redirect_url_falls_back_to_sandbox() {
        let preference = Preference {
            id: "pref-1".to_string(),
            init_point: None,
            sandbox_init_point: Some("https://pay.test/sandbox".to_string()),
        };
        assert_eq!(preference.redirect_url(), Some("https://pay.test/sandbox"));

        let empty_live = Preference {
            id: "pref-1".to_string(),
            init_point: Some(String::new()),
            sandbox_init_point: Some("https://pay.test/sandbox".to_string()),
        };
        assert_eq!(empty_live.redirect_url(), Some("https://pay.test/sandbox"));
    }

    #[test]
    fn redirect_url_is_none_when_both_missing() {
        let preference = Preference {
            id: "pref-1".to_string(),
            init_point: None,
            sandbox_init_point: None,
        };
        assert_eq!(preference.redirect_url(), None);
    }

    #[test]
    fn payment_deserializes_unknown_status() {
        let payment: ProviderPayment = serde_json::from_str(
            r#"{"id": 42, "status": "charged_back", "transaction_amount": 7000.0, "external_reference": "9"}"#,
        )
        .unwrap();
        assert_eq!(payment.status, ProviderPaymentStatus::Unknown);
        assert_eq!(payment.external_reference.as_deref(), Some("9"));
    }

    #[test]
    fn preference_request_serializes_auto_return() {
        let items = vec![PreferenceItem {
            title: "Remera lisa".to_string(),
            quantity: 2,
            unit_price: Decimal::new(2500, 0),
            currency_id: "ARS".to_string(),
        }];
        let payer = PreferencePayer {
            name: "Ana".to_string(),
            surname: "Gomez".to_string(),
            email: "ana@example.com".to_string(),
        };
        let request = PreferenceRequest {
            items: &items,
            payer: &payer,
            external_reference: "17".to_string(),
            back_urls: BackUrls {
                success: "https://shop.test/checkout/result".to_string(),
                failure: "https://shop.test/checkout/result".to_string(),
                pending: "https://shop.test/checkout/result".to_string(),
            },
            auto_return: "approved",
            notification_url: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["auto_return"], "approved");
        assert_eq!(value["external_reference"], "17");
        assert_eq!(value["items"][0]["unit_price"], 2500.0);
        assert_eq!(
            value["back_urls"]["pending"],
            "https://shop.test/checkout/result"
        );
        assert!(value.get("notification_url").is_none());
    }

    #[test]
    fn notification_url_derives_from_the_public_base() {
        let config = RelayConfig {
            host: std::net::IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            provider_base_url: Url::parse("https://provider.test/").unwrap(),
            provider_token: SecretString::from("APP_USR-8731-0925"),
            order_api_base_url: Url::parse("https://orders.test/").unwrap(),
            order_api_token: SecretString::from("service-8731"),
            public_base_url: Some(Url::parse("https://relay.tiendalapacho.com.ar/").unwrap()),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let client = ProviderClient::new(&config);
        assert_eq!(
            client.notification_url.as_deref(),
            Some("https://relay.tiendalapacho.com.ar/payments/webhook")
        );
    }
}
