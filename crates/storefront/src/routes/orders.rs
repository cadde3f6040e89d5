//! Order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use milkrun_core::Order;
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::OrderRequest;
use crate::state::AppState;

/// Message returned when the order was stored and the admin was notified.
pub const ORDER_PLACED: &str = "✅ Order placed successfully! SMS sent to admin.";
/// Message returned when the order was stored but the notification failed.
pub const ORDER_PLACED_UNNOTIFIED: &str = "✅ Order placed but SMS failed.";

/// Response for a placed order.
#[derive(Debug, Serialize)]
pub struct OrderPlaced {
    pub message: String,
    /// Whether the admin notification went out.
    pub notified: bool,
}

/// List every order, oldest first.
///
/// GET /api/orders
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    let orders = state.orders().load_all().await?;
    Ok(Json(orders))
}

/// Place an order.
///
/// POST /api/order
///
/// Responds 200 whenever the order was persisted, whether or not the admin
/// notification succeeded; the message and `notified` flag tell the two
/// apart.
#[instrument(skip(state, payload))]
pub async fn place(
    State(state): State<AppState>,
    payload: std::result::Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Json<OrderPlaced>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let placed = state.intake().place(request).await?;

    let total = placed.order.total.to_string();
    add_breadcrumb("order", "Order placed", Some(&[("total", total.as_str())]));

    let notified = placed.notified();
    let message = if notified {
        ORDER_PLACED
    } else {
        ORDER_PLACED_UNNOTIFIED
    };

    Ok(Json(OrderPlaced {
        message: message.to_string(),
        notified,
    }))
}
