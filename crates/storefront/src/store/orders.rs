//! File-backed order log.

use std::path::PathBuf;

use async_trait::async_trait;
use milkrun_core::Order;
use tracing::instrument;

use super::{JsonDocument, OrderStore, StoreError};

/// Order log kept in a single JSON document (`orders.json`).
#[derive(Debug)]
pub struct FileOrderStore {
    document: JsonDocument<Order>,
}

impl FileOrderStore {
    /// Open the order log at `path`, starting an empty log on first run.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the log file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let document = JsonDocument::open_or_init(path, Vec::new).await?;
        Ok(Self { document })
    }
}

#[async_trait]
impl OrderStore for FileOrderStore {
    async fn load_all(&self) -> Result<Vec<Order>, StoreError> {
        self.document.read().await
    }

    #[instrument(skip(self, order), fields(customer = %order.name, total = %order.total))]
    async fn append(&self, order: Order) -> Result<(), StoreError> {
        self.document.update(move |orders| orders.push(order)).await
    }
}
