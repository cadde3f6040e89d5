//! Order intake pipeline.
//!
//! One call to [`OrderIntake::place`] takes a customer's order from request
//! to persisted record:
//!
//! ```text
//! validate -> load catalog -> compute total -> build order -> persist -> notify
//! ```
//!
//! The stages run strictly in that order. A failure before or during
//! persistence ends the intake with nothing stored. Once the order is in the
//! log the intake has succeeded; the notification outcome only travels along
//! with the result.

use std::sync::Arc;

use milkrun_core::{
    Coordinate, Location, Order, OrderDate, OrderItem, PricingError, compute_total,
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::services::sms::{Delivery, Notifier, NotifyError};
use crate::store::{CatalogStore, OrderStore, StoreError};

/// An order as submitted by the storefront page.
///
/// Fields are lenient on the wire so that shape problems surface as
/// [`IntakeError::Invalid`] with a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    /// Any JSON scalar; absent when the field is left out.
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Value>,
}

/// Keep an explicit `null` as `Some(Value::Null)` rather than `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A requested line before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemRequest {
    #[serde(default)]
    pub name: String,
    pub qty: i64,
}

/// Errors that end an intake without an order being placed.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The request is missing a field or carries a bad value.
    #[error("invalid order: {0}")]
    Invalid(String),

    /// The order total falls outside the representable range.
    #[error("order cannot be priced: {0}")]
    Unpriceable(#[from] PricingError),

    /// The catalog could not be read, so the order could not be priced.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(#[source] StoreError),

    /// The order could not be written to the order log.
    #[error("order not persisted: {0}")]
    NotPersisted(#[source] StoreError),
}

/// How the admin notification went for a placed order.
#[derive(Debug)]
pub enum NotificationOutcome {
    Sent(Delivery),
    Failed(NotifyError),
}

/// A successfully persisted order.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    pub notification: NotificationOutcome,
}

impl PlacedOrder {
    /// Returns `true` if the admin was notified.
    #[must_use]
    pub const fn notified(&self) -> bool {
        matches!(self.notification, NotificationOutcome::Sent(_))
    }
}

/// Orchestrates catalog lookup, pricing, persistence and notification.
#[derive(Clone)]
pub struct OrderIntake {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for OrderIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderIntake").finish_non_exhaustive()
    }
}

impl OrderIntake {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            catalog,
            orders,
            notifier,
        }
    }

    /// Run one order through the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `IntakeError` if the request is invalid, the catalog cannot be
    /// read, the total overflows, or the order cannot be persisted. Notification failures are not
    /// errors; they are reported in [`PlacedOrder::notification`].
    #[instrument(skip(self, request), fields(customer = %request.name, items = request.items.len()))]
    pub async fn place(&self, request: OrderRequest) -> Result<PlacedOrder, IntakeError> {
        let (items, location) = validate(&request)?;

        let catalog = self.catalog.load_all().await.map_err(|e| {
            error!(error = %e, "Catalog unavailable during intake");
            IntakeError::CatalogUnavailable(e)
        })?;

        let total = compute_total(&items, &catalog).inspect_err(|e| {
            warn!(error = %e, "Order could not be priced");
        })?;
        let order = Order {
            name: request.name,
            phone: request.phone,
            items,
            total,
            location: location.to_string(),
            date: OrderDate::now(),
        };

        self.orders.append(order.clone()).await.map_err(|e| {
            error!(error = %e, "Failed to persist order");
            IntakeError::NotPersisted(e)
        })?;
        info!(total = %order.total, "Order persisted");

        let notification = match self.notifier.notify(&order).await {
            Ok(delivery) => {
                info!(message_id = ?delivery.message_id, "Admin notified");
                NotificationOutcome::Sent(delivery)
            }
            Err(e) => {
                warn!(error = %e, "Order notification failed");
                NotificationOutcome::Failed(e)
            }
        };

        Ok(PlacedOrder {
            order,
            notification,
        })
    }
}

/// Check the request shape and convert its items and coordinates.
fn validate(request: &OrderRequest) -> Result<(Vec<OrderItem>, Location), IntakeError> {
    if request.name.trim().is_empty() {
        return Err(IntakeError::Invalid("name is required".to_string()));
    }
    if request.phone.trim().is_empty() {
        return Err(IntakeError::Invalid("phone is required".to_string()));
    }
    if request.items.is_empty() {
        return Err(IntakeError::Invalid(
            "at least one item is required".to_string(),
        ));
    }

    let items = request
        .items
        .iter()
        .map(|item| {
            if item.name.trim().is_empty() {
                return Err(IntakeError::Invalid("item name is required".to_string()));
            }
            match u32::try_from(item.qty) {
                Ok(qty) if qty > 0 => Ok(OrderItem::new(item.name.clone(), qty)),
                _ => Err(IntakeError::Invalid(format!(
                    "quantity of {} must be a positive whole number",
                    item.name
                ))),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let location = Location::new(
        coordinate("latitude", request.latitude.as_ref())?,
        coordinate("longitude", request.longitude.as_ref())?,
    );

    Ok((items, location))
}

/// Convert a submitted coordinate, keeping non-numeric scalars as text.
fn coordinate(field: &str, value: Option<&Value>) -> Result<Option<Coordinate>, IntakeError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let coordinate = match value {
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| Coordinate::Raw(n.to_string()), Coordinate::Degrees),
        Value::String(text) => Coordinate::Raw(text.clone()),
        Value::Bool(_) | Value::Null => Coordinate::Raw(value.to_string()),
        Value::Array(_) | Value::Object(_) => {
            return Err(IntakeError::Invalid(format!("{field} must be a single value")));
        }
    };
    Ok(Some(coordinate))
}
