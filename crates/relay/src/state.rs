//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::orders::OrderConfirmer;
use crate::provider::ProviderClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the provider client, the order confirmer, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RelayConfig,
    provider: ProviderClient,
    orders: OrderConfirmer,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let provider = ProviderClient::new(&config);
        let orders = OrderConfirmer::new(&config);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                provider,
                orders,
            }),
        }
    }

    /// Get a reference to the relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.inner.config
    }

    /// Get a reference to the payment provider client.
    #[must_use]
    pub fn provider(&self) -> &ProviderClient {
        &self.inner.provider
    }

    /// Get a reference to the order confirmer.
    #[must_use]
    pub fn orders(&self) -> &OrderConfirmer {
        &self.inner.orders
    }
}
