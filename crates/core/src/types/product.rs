//! Catalog product type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`Product`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// The product name is empty or whitespace.
    #[error("product name cannot be empty")]
    EmptyName,
    /// The price is below zero.
    #[error("price of {name} cannot be negative")]
    NegativePrice {
        /// Name of the offending product.
        name: String,
    },
}

/// A sellable product in the catalog.
///
/// Products are keyed by `name` by convention only; the catalog does not
/// enforce uniqueness and pricing always resolves to the first match.
///
/// ## Wire format
///
/// ```json
/// { "name": "Fresh Cow Milk", "price": 80, "unit": "1L", "image": "" }
/// ```
///
/// `image` is a reference path such as `/uploads/1718000000000.jpg`, or the
/// empty string when the product has no picture. A missing `image` field is
/// read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub unit: String,
    #[serde(default)]
    pub image: String,
}

impl Product {
    /// Create a product without an image.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            unit: unit.into(),
            image: String::new(),
        }
    }

    /// Attach an image reference path.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Returns `true` if the product has an image reference.
    #[must_use]
    pub const fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// Check the product against the catalog constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the price is negative.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.name.trim().is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductError::NegativePrice {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// The starter catalog written on first run.
#[must_use]
pub fn seed_catalog() -> Vec<Product> {
    vec![
        Product::new("Fresh Cow Milk", Decimal::from(80), "1L"),
        Product::new("Fresh Curd", Decimal::from(50), "1kg"),
        Product::new("Soft Milk 500ml", Decimal::from(40), "500ml"),
    ]
}
