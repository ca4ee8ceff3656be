//! Relay endpoints against stub provider and order APIs.
//!
//! The real relay router runs on an ephemeral port, pointed at stub servers
//! standing in for the payment provider and the order API. Requests travel
//! over actual sockets via reqwest.

use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use lapacho_relay::config::RelayConfig;
use lapacho_relay::routes;
use lapacho_relay::state::AppState;
use lapacho_integration_tests::spawn_server;

// ============================================================================
// Stub provider and order API
// ============================================================================

#[derive(Default)]
struct StubBackends {
    /// Bodies of POST /checkout/preferences requests.
    preference_requests: Mutex<Vec<Value>>,
    /// Payments served by GET /v1/payments/{id}, keyed by id.
    payments: Mutex<Vec<(i64, Value)>>,
    /// Bodies of POST /payments/confirm requests.
    confirmations: Mutex<Vec<Value>>,
    /// When set, preference creation answers only a sandbox URL.
    sandbox_only: Mutex<bool>,
    /// When set, preference creation fails with a 500.
    fail_preferences: Mutex<bool>,
}

impl StubBackends {
    fn add_payment(&self, id: i64, payment: Value) {
        self.payments.lock().unwrap().push((id, payment));
    }
}

async fn stub_create_preference(
    State(stub): State<Arc<StubBackends>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if *stub.fail_preferences.lock().unwrap() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "provider down"})),
        );
    }
    stub.preference_requests.lock().unwrap().push(body);

    let sandbox_only = *stub.sandbox_only.lock().unwrap();
    let response = if sandbox_only {
        json!({
            "id": "pref-sandbox",
            "sandbox_init_point": "https://sandbox.pay.test/p/pref-sandbox"
        })
    } else {
        json!({
            "id": "pref-live",
            "init_point": "https://pay.test/p/pref-live",
            "sandbox_init_point": "https://sandbox.pay.test/p/pref-live"
        })
    };
    (StatusCode::CREATED, Json(response))
}

async fn stub_get_payment(
    State(stub): State<Arc<StubBackends>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    let payments = stub.payments.lock().unwrap();
    payments.iter().find(|(pid, _)| *pid == id).map_or_else(
        || (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))),
        |(_, payment)| (StatusCode::OK, Json(payment.clone())),
    )
}

async fn stub_confirm(
    State(stub): State<Arc<StubBackends>>,
    Json(body): Json<Value>,
) -> StatusCode {
    stub.confirmations.lock().unwrap().push(body);
    StatusCode::OK
}

fn backend_router(stub: Arc<StubBackends>) -> Router {
    Router::new()
        .route("/checkout/preferences", post(stub_create_preference))
        .route("/v1/payments/{id}", get(stub_get_payment))
        .route("/payments/confirm", post(stub_confirm))
        .with_state(stub)
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    stub: Arc<StubBackends>,
    relay_url: String,
    client: reqwest::Client,
}

async fn harness() -> Harness {
    let stub = Arc::new(StubBackends::default());
    // One stub server plays both the provider and the order API; the relay
    // only sees two base URLs.
    let backend_url = spawn_server(backend_router(Arc::clone(&stub))).await;

    let config = RelayConfig {
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        provider_base_url: Url::parse(&format!("{backend_url}/")).unwrap(),
        provider_token: SecretString::from("APP_USR-test-1234"),
        order_api_base_url: Url::parse(&format!("{backend_url}/")).unwrap(),
        order_api_token: SecretString::from("service-token-1234"),
        public_base_url: None,
        sentry_dsn: None,
        sentry_environment: None,
    };
    let relay_url = spawn_server(routes::router(AppState::new(config))).await;

    Harness {
        stub,
        relay_url,
        client: reqwest::Client::new(),
    }
}

fn session_request() -> Value {
    json!({
        "orderId": 42,
        "items": [
            {"title": "Ambo clásico", "quantity": 2, "unitPrice": "2500"},
            {"title": "Envío", "quantity": 1, "unitPrice": "2000"}
        ],
        "payer": {
            "name": "Ana", "surname": "Gómez",
            "email": "ana@example.com", "phone": "362-400-0000"
        },
        "returnUrl": "https://shop.test/checkout/result"
    })
}

// ============================================================================
// Checkout session tests
// ============================================================================

#[tokio::test]
async fn checkout_session_returns_the_provider_redirect() {
    let h = harness().await;

    let response = h
        .client
        .post(format!("{}/payments/checkout-session", h.relay_url))
        .json(&session_request())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["preferenceId"], "pref-live");
    assert_eq!(body["redirectUrl"], "https://pay.test/p/pref-live");

    // The provider saw the order id as external reference and the return
    // URL on every back URL.
    let requests = h.stub.preference_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["external_reference"], "42");
    assert_eq!(requests[0]["auto_return"], "approved");
    assert_eq!(
        requests[0]["back_urls"]["success"],
        "https://shop.test/checkout/result"
    );
    assert_eq!(requests[0]["items"][0]["unit_price"], 2500.0);
    assert_eq!(requests[0]["items"][0]["currency_id"], "ARS");
}

#[tokio::test]
async fn checkout_session_falls_back_to_the_sandbox_url() {
    let h = harness().await;
    *h.stub.sandbox_only.lock().unwrap() = true;

    let body: Value = h
        .client
        .post(format!("{}/payments/checkout-session", h.relay_url))
        .json(&session_request())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["redirectUrl"], "https://sandbox.pay.test/p/pref-sandbox");
}

#[tokio::test]
async fn checkout_session_with_no_items_is_a_bad_request() {
    let h = harness().await;
    let mut request = session_request();
    request["items"] = json!([]);

    let response = h
        .client
        .post(format!("{}/payments/checkout-session", h.relay_url))
        .json(&request)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(h.stub.preference_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway_without_detail() {
    let h = harness().await;
    *h.stub.fail_preferences.lock().unwrap() = true;

    let response = h
        .client
        .post(format!("{}/payments/checkout-session", h.relay_url))
        .json(&session_request())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body = response.text().await.unwrap();
    assert!(!body.contains("provider down"), "upstream detail must not leak");
}

// ============================================================================
// Webhook tests
// ============================================================================

#[tokio::test]
async fn webhook_query_form_confirms_an_approved_payment() {
    let h = harness().await;
    h.stub.add_payment(
        314,
        json!({
            "id": 314,
            "status": "approved",
            "transaction_amount": 7000.0,
            "external_reference": "42"
        }),
    );

    let response = h
        .client
        .post(format!(
            "{}/payments/webhook?topic=payment&id=314",
            h.relay_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let confirmations = h.stub.confirmations.lock().unwrap();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0]["orderId"], 42);
    assert_eq!(confirmations[0]["paymentId"], 314);
    assert_eq!(confirmations[0]["status"], "paid");
    assert_eq!(confirmations[0]["amount"], "7000");
}

#[tokio::test]
async fn webhook_body_form_parses_the_payment_id() {
    let h = harness().await;
    h.stub.add_payment(
        315,
        json!({"id": 315, "status": "approved", "external_reference": "43"}),
    );

    let response = h
        .client
        .post(format!("{}/payments/webhook", h.relay_url))
        .json(&json!({"action": "payment.updated", "data": {"id": "315"}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let confirmations = h.stub.confirmations.lock().unwrap();
    assert_eq!(confirmations.len(), 1);
    assert_eq!(confirmations[0]["orderId"], 43);
    assert!(confirmations[0].get("amount").is_none());
}

#[tokio::test]
async fn webhook_does_not_confirm_non_approved_payments() {
    let h = harness().await;
    h.stub.add_payment(
        316,
        json!({"id": 316, "status": "rejected", "external_reference": "44"}),
    );

    // The client reconciles failures itself on redirect; only approved
    // results travel server-to-server.
    let response = h
        .client
        .post(format!(
            "{}/payments/webhook?topic=payment&id=316",
            h.relay_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(h.stub.confirmations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_ignores_non_payment_topics() {
    let h = harness().await;

    let response = h
        .client
        .post(format!(
            "{}/payments/webhook?topic=merchant_order&id=99",
            h.relay_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(h.stub.confirmations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_acknowledges_payments_without_an_order_reference() {
    let h = harness().await;
    h.stub
        .add_payment(316, json!({"id": 316, "status": "approved"}));

    let response = h
        .client
        .post(format!(
            "{}/payments/webhook?topic=payment&id=316",
            h.relay_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(h.stub.confirmations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_acknowledges_unknown_payments() {
    let h = harness().await;

    // No payment registered: the provider lookup 404s, the webhook still
    // answers 200 so the provider stops retrying.
    let response = h
        .client
        .post(format!(
            "{}/payments/webhook?topic=payment&id=999",
            h.relay_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn health_endpoint_answers_ok() {
    let h = harness().await;
    let response = h
        .client
        .get(format!("{}/health", h.relay_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
