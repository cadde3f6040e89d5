//! Order total computation.
//!
//! The total is resolved against a single catalog snapshot: each requested
//! item is priced by the first product whose name is exactly equal
//! (case-sensitive). Items with no matching product contribute nothing and
//! never cause an error.
//!
//! Arithmetic is exact decimal arithmetic with no rounding to a currency
//! precision.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{OrderItem, Product};

/// Errors raised while pricing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// A line or the running total left the representable decimal range.
    #[error("order total is too large to compute (at item {item:?})")]
    Overflow { item: String },
}

/// Compute the total of `items` priced against `catalog`.
///
/// Deterministic for a given snapshot and independent of item order.
///
/// # Errors
///
/// Returns `PricingError::Overflow` if a line price or the sum exceeds the
/// range of `Decimal`.
pub fn compute_total(items: &[OrderItem], catalog: &[Product]) -> Result<Decimal, PricingError> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        let Some(product) = find_product(catalog, &item.name) else {
            return Ok(total);
        };
        product
            .price
            .checked_mul(Decimal::from(item.qty))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| PricingError::Overflow {
                item: item.name.clone(),
            })
    })
}

/// First product whose name matches `name` exactly.
#[must_use]
pub fn find_product<'a>(catalog: &'a [Product], name: &str) -> Option<&'a Product> {
    catalog.iter().find(|product| product.name == name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::seed_catalog;

    #[test]
    fn test_single_matching_item() {
        let catalog = vec![Product::new("Fresh Cow Milk", Decimal::from(80), "1L")];
        let items = vec![OrderItem::new("Fresh Cow Milk", 2)];
        assert_eq!(compute_total(&items, &catalog).unwrap(), Decimal::from(160));
    }

    #[test]
    fn test_unknown_item_contributes_nothing() {
        let catalog = vec![Product::new("Fresh Curd", Decimal::from(50), "1kg")];
        let items = vec![OrderItem::new("Unknown Item", 3)];
        assert_eq!(compute_total(&items, &catalog).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_mixed_known_and_unknown_items() {
        let items = vec![
            OrderItem::new("Fresh Curd", 2),
            OrderItem::new("Goat Cheese", 5),
            OrderItem::new("Soft Milk 500ml", 1),
        ];
        assert_eq!(compute_total(&items, &seed_catalog()).unwrap(), Decimal::from(140));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let items = vec![OrderItem::new("fresh cow milk", 1)];
        assert_eq!(compute_total(&items, &seed_catalog()).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let catalog = vec![
            Product::new("Fresh Curd", Decimal::from(50), "1kg"),
            Product::new("Fresh Curd", Decimal::from(70), "1kg"),
        ];
        let items = vec![OrderItem::new("Fresh Curd", 1)];
        assert_eq!(compute_total(&items, &catalog).unwrap(), Decimal::from(50));
    }

    #[test]
    fn test_total_independent_of_item_order() {
        let catalog = seed_catalog();
        let mut items = vec![
            OrderItem::new("Fresh Cow Milk", 3),
            OrderItem::new("Fresh Curd", 1),
            OrderItem::new("Soft Milk 500ml", 4),
        ];
        let forward = compute_total(&items, &catalog).unwrap();
        items.reverse();
        assert_eq!(compute_total(&items, &catalog).unwrap(), forward);
        assert_eq!(forward, Decimal::from(450));
    }

    #[test]
    fn test_fractional_prices_are_exact() {
        let catalog = vec![
            Product::new("Buttermilk", Decimal::new(10, 2), "200ml"),
            Product::new("Lassi", Decimal::new(20, 2), "200ml"),
        ];
        let items = vec![OrderItem::new("Buttermilk", 1), OrderItem::new("Lassi", 1)];
        assert_eq!(compute_total(&items, &catalog).unwrap(), Decimal::new(30, 2));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(compute_total(&[], &seed_catalog()).unwrap(), Decimal::ZERO);
        assert_eq!(
            compute_total(&[OrderItem::new("Fresh Curd", 1)], &[]).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_line_overflow_is_an_error() {
        let catalog = vec![Product::new(
            "Gold Milk",
            Decimal::from_i128_with_scale(70_000_000_000_000_000_000_000_000_000, 0),
            "1L",
        )];
        let items = vec![OrderItem::new("Gold Milk", 2)];
        assert_eq!(
            compute_total(&items, &catalog),
            Err(PricingError::Overflow {
                item: "Gold Milk".to_string()
            })
        );
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let catalog = vec![
            Product::new("Gold Milk", Decimal::MAX, "1L"),
            Product::new("Fresh Curd", Decimal::from(50), "1kg"),
        ];
        let items = vec![OrderItem::new("Gold Milk", 1), OrderItem::new("Fresh Curd", 1)];
        assert!(matches!(
            compute_total(&items, &catalog),
            Err(PricingError::Overflow { item }) if item == "Fresh Curd"
        ));
    }

    #[test]
    fn test_find_product() {
        let catalog = seed_catalog();
        assert_eq!(
            find_product(&catalog, "Fresh Curd").unwrap().unit,
            "1kg"
        );
        assert!(find_product(&catalog, "Ghee").is_none());
    }
}
