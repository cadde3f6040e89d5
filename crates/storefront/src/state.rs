//! Application state shared across handlers.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::StorefrontConfig;
use crate::services::{
    DisabledNotifier, Notifier, NotifyError, OrderIntake, TwilioNotifier, UploadError, UploadStore,
};
use crate::store::{CatalogStore, FileCatalogStore, FileOrderStore, OrderStore, StoreError};

/// Error opening the application's backing resources.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("upload directory error: {0}")]
    Upload(#[from] UploadError),
    #[error("notifier error: {0}")]
    Notifier(#[from] NotifyError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// stores, the upload directory and the intake pipeline. Everything is
/// constructed once at start-up; handlers hold no other shared state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    uploads: UploadStore,
    intake: OrderIntake,
}

impl AppState {
    /// Create application state from already-opened components.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `catalog` - Catalog store
    /// * `orders` - Order log
    /// * `uploads` - Image upload directory
    /// * `notifier` - Admin notification channel
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        uploads: UploadStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let intake = OrderIntake::new(Arc::clone(&catalog), Arc::clone(&orders), notifier);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                orders,
                uploads,
                intake,
            }),
        }
    }

    /// Open the file stores and notifier described by `config`.
    ///
    /// Creates the data directory, seeds the catalog and starts an empty
    /// order log on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if a backing file or directory cannot be created, or
    /// if the SMS client cannot be built.
    pub async fn open(config: StorefrontConfig) -> Result<Self, StartupError> {
        let catalog = FileCatalogStore::open(config.catalog_path()).await?;
        let orders = FileOrderStore::open(config.orders_path()).await?;
        let uploads = UploadStore::open(config.uploads_dir()).await?;

        let notifier: Arc<dyn Notifier> = match &config.sms {
            Some(sms) => {
                info!(admin_phone = %sms.admin_phone, "SMS notifications enabled");
                Arc::new(TwilioNotifier::new(sms)?)
            }
            None => {
                warn!("TWILIO_SID not set; order notifications are disabled");
                Arc::new(DisabledNotifier)
            }
        };

        Ok(Self::new(
            config,
            Arc::new(catalog),
            Arc::new(orders),
            uploads,
            notifier,
        ))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the catalog store.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogStore {
        self.inner.catalog.as_ref()
    }

    /// Get the order log.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// Get the image upload directory.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Get the order intake pipeline.
    #[must_use]
    pub fn intake(&self) -> &OrderIntake {
        &self.inner.intake
    }
}
