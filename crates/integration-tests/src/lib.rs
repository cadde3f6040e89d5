//! Integration tests for Milkrun.
//!
//! Each test starts a real storefront on an ephemeral port, backed by a
//! fresh temporary data directory, and talks to it over HTTP with
//! `reqwest`. SMS delivery is replaced by a [`RecordingNotifier`] so no test
//! reaches the network beyond localhost.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p milkrun-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use milkrun_core::Order;
use milkrun_storefront::config::StorefrontConfig;
use milkrun_storefront::routes;
use milkrun_storefront::services::{Delivery, Notifier, NotifyError, UploadStore};
use milkrun_storefront::state::AppState;
use milkrun_storefront::store::{FileCatalogStore, FileOrderStore};
use tempfile::TempDir;

/// Marker text served as the bundled page in tests.
pub const INDEX_MARKER: &str = "milkrun test page";

/// Notifier that records every order it is asked to announce.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Order>>,
    fail: bool,
}

impl RecordingNotifier {
    /// A notifier whose deliveries always succeed.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries always fail with a provider error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Orders passed to [`Notifier::notify`], in call order.
    #[must_use]
    pub fn sent(&self) -> Vec<Order> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, order: &Order) -> Result<Delivery, NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(order.clone());

        if self.fail {
            return Err(NotifyError::Provider {
                status: 401,
                message: "Authenticate".to_string(),
            });
        }
        Ok(Delivery {
            message_id: Some("SM-test".to_string()),
        })
    }
}

/// A running storefront bound to a temporary data directory.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub notifier: Arc<RecordingNotifier>,
    data_dir: TempDir,
}

impl TestServer {
    /// Start a storefront whose notifications succeed.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start() -> Self {
        Self::start_with(RecordingNotifier::succeeding()).await
    }

    /// Start a storefront with the given notifier.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start_with(notifier: RecordingNotifier) -> Self {
        let data_dir = TempDir::new().expect("Failed to create temp dir");
        Self::start_in(data_dir, notifier).await
    }

    /// Start a storefront over an already-populated data directory.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start_in(data_dir: TempDir, notifier: RecordingNotifier) -> Self {
        let static_dir = data_dir.path().join("static");
        std::fs::create_dir_all(&static_dir).expect("Failed to create static dir");
        std::fs::write(
            static_dir.join("index.html"),
            format!("<!doctype html><title>{INDEX_MARKER}</title>"),
        )
        .expect("Failed to write index page");

        let config = test_config(data_dir.path(), &static_dir);
        let catalog = FileCatalogStore::open(config.catalog_path())
            .await
            .expect("Failed to open catalog");
        let orders = FileOrderStore::open(config.orders_path())
            .await
            .expect("Failed to open order log");
        let uploads = UploadStore::open(config.uploads_dir())
            .await
            .expect("Failed to open uploads");

        let notifier = Arc::new(notifier);
        let state = AppState::new(
            config,
            Arc::new(catalog),
            Arc::new(orders),
            uploads,
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, routes::app(state))
                .await
                .expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            notifier,
            data_dir,
        }
    }

    /// Absolute URL for a server path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Path of a file inside the data directory.
    #[must_use]
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.path().join(name)
    }
}

/// Configuration pointing at `data_dir`, with SMS left unconfigured.
///
/// # Panics
///
/// Panics if the configuration is rejected.
#[must_use]
pub fn test_config(data_dir: &Path, static_dir: &Path) -> StorefrontConfig {
    let data_dir = data_dir.display().to_string();
    let static_dir = static_dir.display().to_string();

    StorefrontConfig::from_lookup(|key| match key {
        "HOST" => Some("127.0.0.1".to_string()),
        "PORT" => Some("0".to_string()),
        "DATA_DIR" => Some(data_dir.clone()),
        "STATIC_DIR" => Some(static_dir.clone()),
        _ => None,
    })
    .expect("Test configuration is valid")
}
