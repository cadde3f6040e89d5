//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`, and every error body is JSON of the form
//! `{"message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{IntakeError, UploadError};
use crate::store::StoreError;

/// Message returned when an order could not be placed.
pub const ORDER_NOT_PLACED: &str = "❌ Order could not be placed. Please try again.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog or order log could not be used.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Order intake failed; no order was placed.
    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),

    /// Uploaded image could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON body of every API message.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Intake(IntakeError::Invalid(_) | IntakeError::Unpriceable(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Intake(_) | Self::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Intake(IntakeError::Invalid(reason)) => format!("❌ {reason}"),
            Self::Intake(IntakeError::Unpriceable(_)) => {
                "❌ Order total is too large. Please reduce the quantities.".to_string()
            }
            Self::Intake(_) => ORDER_NOT_PLACED.to_string(),
            Self::Store(_) => "❌ Store data is unavailable.".to_string(),
            Self::Upload(_) => "❌ Image could not be stored.".to_string(),
            Self::BadRequest(reason) => format!("❌ {reason}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = MessageBody {
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for storefront actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("order", "Order placed", Some(&[("total", "160")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
