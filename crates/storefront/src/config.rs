//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `DATA_DIR` - Directory holding `products.json`, `orders.json` and `uploads/` (default: data)
//! - `STATIC_DIR` - Directory of the bundled storefront page (default: crates/storefront/static)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! ## SMS notifications
//!
//! SMS is enabled when `TWILIO_SID` is set; the rest of the group is then required.
//! - `TWILIO_SID` - Messaging account identifier
//! - `TWILIO_AUTH_TOKEN` - Messaging auth token
//! - `TWILIO_PHONE` - Sender phone number
//! - `ADMIN_PHONE` - Recipient phone number for order notifications
//! - `TWILIO_API_BASE` - Provider base URL (default: <https://api.twilio.com>)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Name of the catalog document inside the data directory.
pub const CATALOG_FILE: &str = "products.json";
/// Name of the order log inside the data directory.
pub const ORDERS_FILE: &str = "orders.json";
/// Name of the image upload directory inside the data directory.
pub const UPLOADS_DIR: &str = "uploads";

const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the catalog, the order log and uploaded images
    pub data_dir: PathBuf,
    /// Directory holding the bundled storefront page
    pub static_dir: PathBuf,
    /// SMS notification settings, `None` when notifications are disabled
    pub sms: Option<SmsConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// SMS provider configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct SmsConfig {
    /// Messaging account identifier
    pub account_sid: String,
    /// Messaging auth token
    pub auth_token: SecretString,
    /// Sender phone number
    pub from_phone: String,
    /// Admin phone number receiving order notifications
    pub admin_phone: String,
    /// Provider API base URL
    pub api_base: Url,
}

impl std::fmt::Debug for SmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_phone", &self.from_phone)
            .field("admin_phone", &self.admin_phone)
            .field("api_base", &self.api_base.as_str())
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if SMS is enabled
    /// without the rest of its settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env
            .or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let data_dir = PathBuf::from(env.or_default("DATA_DIR", "data"));
        let static_dir = PathBuf::from(env.or_default("STATIC_DIR", "crates/storefront/static"));
        let sms = SmsConfig::from_env(&env)?;

        Ok(Self {
            host,
            port,
            data_dir,
            static_dir,
            sms,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the catalog document.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join(CATALOG_FILE)
    }

    /// Path of the order log.
    #[must_use]
    pub fn orders_path(&self) -> PathBuf {
        self.data_dir.join(ORDERS_FILE)
    }

    /// Directory receiving uploaded product images.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join(UPLOADS_DIR)
    }
}

impl SmsConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(account_sid) = env.optional("TWILIO_SID") else {
            return Ok(None);
        };

        let api_base = env.or_default("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE);
        let api_base = Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("TWILIO_API_BASE".to_string(), e.to_string()))?;

        Ok(Some(Self {
            account_sid,
            auth_token: env.validated_secret("TWILIO_AUTH_TOKEN")?,
            from_phone: env.required("TWILIO_PHONE")?,
            admin_phone: env.required("ADMIN_PHONE")?,
            api_base,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the defaulting rules shared by every setting.
///
/// Blank values count as unset.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let secret = SecretString::from(self.required(key)?);
        validate_secret_strength(&secret, key)?;
        Ok(secret)
    }
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.expose_secret().to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const SMS_VARS: &[(&str, &str)] = &[
        ("TWILIO_SID", "AC1f0e2d3c4b5a69788796a5b4c3d2e1f0"),
        ("TWILIO_AUTH_TOKEN", "9b1e4f7a2c5d8e0b3f6a9c2e5d8b1f4a"),
        ("TWILIO_PHONE", "+15005550006"),
        ("ADMIN_PHONE", "+919800000000"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.sms.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_data_paths() {
        let config = load(&[("DATA_DIR", "/var/lib/milkrun")]).unwrap();
        assert_eq!(
            config.catalog_path(),
            PathBuf::from("/var/lib/milkrun/products.json")
        );
        assert_eq!(
            config.orders_path(),
            PathBuf::from("/var/lib/milkrun/orders.json")
        );
        assert_eq!(config.uploads_dir(), PathBuf::from("/var/lib/milkrun/uploads"));
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[("PORT", "not-a-port")]);
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "PORT"));
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = load(&[("PORT", "  ")]).unwrap();
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_socket_addr() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "8080")]).unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_sms_enabled() {
        let config = load(SMS_VARS).unwrap();
        let sms = config.sms.unwrap();
        assert_eq!(sms.from_phone, "+15005550006");
        assert_eq!(sms.admin_phone, "+919800000000");
        assert_eq!(sms.api_base.as_str(), "https://api.twilio.com/");
    }

    #[test]
    fn test_sms_requires_admin_phone() {
        let vars: Vec<_> = SMS_VARS
            .iter()
            .copied()
            .filter(|(k, _)| *k != "ADMIN_PHONE")
            .collect();
        let result = load(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "ADMIN_PHONE"));
    }

    #[test]
    fn test_sms_rejects_placeholder_token() {
        let mut vars = SMS_VARS.to_vec();
        vars.retain(|(k, _)| *k != "TWILIO_AUTH_TOKEN");
        vars.push(("TWILIO_AUTH_TOKEN", "your-auth-token"));
        let result = load(&vars);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_sms_rejects_invalid_api_base() {
        let mut vars = SMS_VARS.to_vec();
        vars.push(("TWILIO_API_BASE", "not a url"));
        let result = load(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "TWILIO_API_BASE")
        );
    }

    #[test]
    fn test_sms_config_debug_redacts_token() {
        let sms = load(SMS_VARS).unwrap().sms.unwrap();
        let debug_output = format!("{sms:?}");

        assert!(debug_output.contains("+919800000000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("9b1e4f7a2c5d8e0b3f6a9c2e5d8b1f4a"));
    }
}
