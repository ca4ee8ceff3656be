//! Lapacho Core - Shared types library.
//!
//! This crate provides common types used across all Tienda Lapacho components:
//! - `checkout` - Client-side checkout orchestration
//! - `relay` - Payment relay service fronting the payment provider
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses
//! - [`cart`] - The client-local cart and its line items
//! - [`order`] - Persisted orders and the payment status state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod types;

pub use cart::{Cart, CartItem};
pub use order::{Contact, Delivery, Order, OrderLine, PaymentAttempt, TransitionError};
pub use types::*;
