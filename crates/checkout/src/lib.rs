//! Checkout orchestration for Tienda Lapacho.
//!
//! This crate turns a client-local cart into a persisted order, then into a
//! payment-provider transaction, and reconciles the payment outcome back into
//! order state. It is the only part of the system with real invariants:
//! idempotent order creation, forward-only payment status transitions, and
//! last-write-wins delivery updates.
//!
//! # Architecture
//!
//! - [`CheckoutOrchestrator`] coordinates the flow and owns the local
//!   cart/order state
//! - [`store::CartStore`] abstracts the persisted cart so tests can substitute
//!   an in-memory store
//! - [`api::OrderApi`] and [`api::PaymentGateway`] are the two external
//!   collaborators; HTTP implementations live in [`api::http`]
//! - [`normalize`] is the single place loose API response shapes become the
//!   canonical [`lapacho_core::Order`]
//!
//! # Example
//!
//! ```rust,ignore
//! use lapacho_checkout::{CheckoutConfig, CheckoutOrchestrator};
//! use lapacho_checkout::api::http::{HttpOrderApi, HttpPaymentGateway};
//! use lapacho_checkout::store::JsonCartStore;
//!
//! let config = CheckoutConfig::from_env()?;
//! let orchestrator = CheckoutOrchestrator::new(
//!     JsonCartStore::new("cart.json"),
//!     HttpOrderApi::new(&config)?,
//!     HttpPaymentGateway::new(&config)?,
//!     config.return_url.as_str(),
//! );
//!
//! let cart = orchestrator.load_cart()?;
//! let order = orchestrator
//!     .create_order(&cart, &form, method, hint, Some(&session))
//!     .await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod session;
pub mod store;
pub mod validate;

pub use config::CheckoutConfig;
pub use error::CheckoutError;
pub use orchestrator::{
    CheckoutOrchestrator, DeliveryUpdate, PaymentInitiation, ProviderOutcome,
};
pub use session::AuthSession;
pub use validate::CheckoutForm;
