//! Core types for Milkrun.
//!
//! This module provides the records persisted by the storefront.

pub mod order;
pub mod product;

pub use order::{Coordinate, Location, Order, OrderDate, OrderItem};
pub use product::{Product, ProductError, seed_catalog};
