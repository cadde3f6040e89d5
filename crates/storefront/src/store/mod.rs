//! Flat-file persistence for the catalog and the order log.
//!
//! # Documents
//!
//! Both stores keep a single pretty-printed JSON array on disk and read or
//! write it whole on every operation:
//!
//! - `products.json` - The catalog ([`CatalogStore`])
//! - `orders.json` - The append-only order log ([`OrderStore`])
//!
//! # Consistency
//!
//! Writes go to a sibling temp file that is renamed over the document, so a
//! reader never observes a half-written file. Mutating operations on one
//! store are serialised by an in-process lock; read-modify-write cycles
//! therefore do not lose appends within a single process. A full catalog
//! replacement still discards any product appended before it (last writer
//! wins). Nothing is coordinated across processes sharing a data directory.

pub mod catalog;
pub mod json_file;
pub mod orders;

use std::path::PathBuf;

use async_trait::async_trait;
use milkrun_core::{Order, Product};
use thiserror::Error;

pub use catalog::FileCatalogStore;
pub use json_file::JsonDocument;
pub use orders::FileOrderStore;

/// Errors raised when a backing document cannot be used.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document exists but is not a valid JSON array of records.
    #[error("corrupt document {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Records could not be encoded.
    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),
}

/// The list of sellable products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read the entire catalog.
    async fn load_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Overwrite the entire catalog.
    async fn replace_all(&self, products: Vec<Product>) -> Result<(), StoreError>;

    /// Add one product at the end of the catalog.
    async fn append(&self, product: Product) -> Result<(), StoreError>;
}

/// The append-only log of placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Read every order, oldest first.
    async fn load_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Add one order at the end of the log.
    async fn append(&self, order: Order) -> Result<(), StoreError>;
}
