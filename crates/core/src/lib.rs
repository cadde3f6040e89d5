//! Milkrun Core - Shared domain types library.
//!
//! This crate provides the domain vocabulary used by the Milkrun components:
//! - `storefront` - The HTTP backend serving the catalog and taking orders
//! - `integration-tests` - End-to-end tests against the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no file
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, orders, order items, locations and timestamps
//! - [`pricing`] - Order total computation against a catalog snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PricingError, compute_total};
pub use types::*;
