//! Integration tests for Tienda Lapacho.
//!
//! Tests in `tests/` spin up in-process axum servers on ephemeral ports and
//! drive the real HTTP clients against them. No external services are
//! required.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lapacho-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - Full checkout orchestration over real sockets
//! - `relay_service` - Relay endpoints against stub provider and order APIs

use axum::Router;
use tokio::net::TcpListener;

/// Serve a router on an ephemeral localhost port and return its base URL.
///
/// The server task runs until the test process exits.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server error");
    });
    format!("http://{addr}")
}
