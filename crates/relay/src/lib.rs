//! Tienda Lapacho payment relay library.
//!
//! This crate provides the relay functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod orders;
pub mod provider;
pub mod routes;
pub mod state;
