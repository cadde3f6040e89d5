//! Order notifications over SMS.
//!
//! Every placed order is summarised in a short text message sent to the
//! admin phone through the Twilio Messages API. Delivery is attempted once;
//! a failure is reported to the caller and never retried.

use std::time::Duration;

use async_trait::async_trait;
use milkrun_core::Order;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::SmsConfig;

/// Upper bound on a single provider round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors raised when an order notification is not delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The provider could not be reached or did not answer in time.
    #[error("SMS request failed: {0}")]
    Request(String),

    /// The provider rejected the message.
    #[error("SMS provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// No provider is configured.
    #[error("SMS notifications are not configured")]
    NotConfigured,
}

/// Proof of a message accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Provider-assigned message identifier, when one was returned.
    pub message_id: Option<String>,
}

/// Sends order notifications to the admin.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a summary of `order`.
    async fn notify(&self, order: &Order) -> Result<Delivery, NotifyError>;
}

/// Render the admin notification text for an order.
#[must_use]
pub fn format_order_message(order: &Order) -> String {
    format!(
        "📦 New Order from {}\nPhone: {}\nItems: {}\nTotal: ₹{}\nLocation: {}",
        order.name,
        order.phone,
        order.items_summary(),
        order.total.normalize(),
        order.location,
    )
}

// =============================================================================
// Twilio
// =============================================================================

/// Twilio Messages API client.
#[derive(Clone)]
pub struct TwilioNotifier {
    client: Client,
    messages_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_phone: String,
    admin_phone: String,
}

impl std::fmt::Debug for TwilioNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioNotifier")
            .field("messages_url", &self.messages_url)
            .field("auth_token", &"[REDACTED]")
            .field("from_phone", &self.from_phone)
            .field("admin_phone", &self.admin_phone)
            .finish_non_exhaustive()
    }
}

/// Successful `POST /Messages.json` response (only the fields we log).
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
}

/// Error body returned by the provider on rejection.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

impl TwilioNotifier {
    /// Create a new Twilio client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SmsConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.api_base.as_str().trim_end_matches('/'),
            config.account_sid
        );

        Ok(Self {
            client,
            messages_url,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_phone: config.from_phone.clone(),
            admin_phone: config.admin_phone.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    #[instrument(skip(self, order), fields(customer = %order.name, to = %self.admin_phone))]
    async fn notify(&self, order: &Order) -> Result<Delivery, NotifyError> {
        let body = format_order_message(order);
        let form = [
            ("Body", body.as_str()),
            ("From", self.from_phone.as_str()),
            ("To", self.admin_phone.as_str()),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(text);
            warn!(status = status.as_u16(), error = %message, "SMS provider rejected message");
            return Err(NotifyError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        debug!(sid = ?resource.sid, "SMS accepted by provider");

        Ok(Delivery {
            message_id: resource.sid,
        })
    }
}

// =============================================================================
// Disabled
// =============================================================================

/// Notifier used when SMS is not configured; every dispatch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _order: &Order) -> Result<Delivery, NotifyError> {
        Err(NotifyError::NotConfigured)
    }
}
