//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `intake` - Order intake pipeline (validate, price, persist, notify)
//! - `sms` - Admin order notifications over SMS
//! - `uploads` - Product image storage

pub mod intake;
pub mod sms;
pub mod uploads;

pub use intake::{
    IntakeError, NotificationOutcome, OrderIntake, OrderItemRequest, OrderRequest, PlacedOrder,
};
pub use sms::{Delivery, DisabledNotifier, Notifier, NotifyError, TwilioNotifier};
pub use uploads::{UPLOADS_ROUTE, UploadError, UploadStore};
