//! File-backed catalog store.

use std::path::PathBuf;

use async_trait::async_trait;
use milkrun_core::{Product, seed_catalog};
use tracing::instrument;

use super::{CatalogStore, JsonDocument, StoreError};

/// Catalog kept in a single JSON document (`products.json`).
#[derive(Debug)]
pub struct FileCatalogStore {
    document: JsonDocument<Product>,
}

impl FileCatalogStore {
    /// Open the catalog at `path`, writing the seed products on first run.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog file cannot be created.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let document = JsonDocument::open_or_init(path, seed_catalog).await?;
        Ok(Self { document })
    }
}

#[async_trait]
impl CatalogStore for FileCatalogStore {
    async fn load_all(&self) -> Result<Vec<Product>, StoreError> {
        self.document.read().await
    }

    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn replace_all(&self, products: Vec<Product>) -> Result<(), StoreError> {
        self.document.replace(&products).await
    }

    #[instrument(skip(self, product), fields(product = %product.name))]
    async fn append(&self, product: Product) -> Result<(), StoreError> {
        self.document
            .update(move |products| products.push(product))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    async fn open_temp() -> (tempfile::TempDir, FileCatalogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::open(dir.path().join("products.json"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_first_run_serves_seed_set() {
        let (_dir, store) = open_temp().await;
        let products = store.load_all().await.unwrap();
        assert_eq!(products, seed_catalog());
    }

    #[tokio::test]
    async fn test_append_then_load_returns_product_last() {
        let (_dir, store) = open_temp().await;
        let ghee = Product::new("Ghee", Decimal::from(300), "500ml").with_image("/uploads/1.jpg");

        store.append(ghee.clone()).await.unwrap();

        let products = store.load_all().await.unwrap();
        assert_eq!(products.len(), 4);
        assert_eq!(products.last(), Some(&ghee));
    }

    #[tokio::test]
    async fn test_replace_with_empty_list() {
        let (_dir, store) = open_temp().await;
        store.replace_all(Vec::new()).await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_then_append() {
        let (_dir, store) = open_temp().await;
        let curd = Product::new("Fresh Curd", Decimal::from(55), "1kg");
        let paneer = Product::new("Paneer", Decimal::from(90), "200g");

        store.replace_all(vec![curd.clone()]).await.unwrap();
        store.append(paneer.clone()).await.unwrap();

        assert_eq!(store.load_all().await.unwrap(), vec![curd, paneer]);
    }

    #[tokio::test]
    async fn test_reopen_keeps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");

        let store = FileCatalogStore::open(&path).await.unwrap();
        store.replace_all(Vec::new()).await.unwrap();
        drop(store);

        let reopened = FileCatalogStore::open(&path).await.unwrap();
        assert!(reopened.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, r#"[{"name": "Milk"}]"#).unwrap();

        let store = FileCatalogStore::open(&path).await.unwrap();
        assert!(matches!(
            store.load_all().await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
