//! A JSON array document on disk.

use std::marker::PhantomData;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::StoreError;

/// A whole-file JSON array of `T` records.
///
/// Every read parses the full file and every write replaces it. Mutations
/// through [`JsonDocument::update`] and [`JsonDocument::replace`] hold a
/// per-document lock for the whole read-modify-write cycle.
#[derive(Debug)]
pub struct JsonDocument<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the document at `path`, creating it with `seed()` if it is absent.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the document or its directory cannot be created.
    pub async fn open_or_init<F>(path: impl Into<PathBuf>, seed: F) -> Result<Self, StoreError>
    where
        F: FnOnce() -> Vec<T>,
    {
        let document = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _records: PhantomData,
        };

        let exists = tokio::fs::try_exists(&document.path)
            .await
            .map_err(|source| document.read_error(source))?;

        if !exists {
            if let Some(parent) = document.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| document.write_error(source))?;
            }
            let records = seed();
            document.write(&records).await?;
            info!(
                path = %document.path.display(),
                records = records.len(),
                "Initialized document"
            );
        }

        Ok(document)
    }

    /// Read and parse every record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Read` if the file cannot be read and
    /// `StoreError::Corrupt` if it does not parse.
    pub async fn read(&self) -> Result<Vec<T>, StoreError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| self.read_error(source))?;

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace every record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the records cannot be encoded or written.
    pub async fn replace(&self, records: &[T]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write(records).await
    }

    /// Read the records, apply `change` and write the result back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read or the write fails. Nothing is written
    /// when the read fails.
    pub async fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<T>) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read().await?;
        change(&mut records);
        self.write(&records).await
    }

    /// Write through a sibling temp file renamed over the document.
    async fn write(&self, records: &[T]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
        let temp_path = self.temp_path();

        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|source| self.write_error(source))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| self.write_error(source))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Document written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_seeded_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("numbers.json");

        let document = JsonDocument::<u32>::open_or_init(&path, || vec![1, 2, 3])
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(document.read().await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_open_keeps_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.json");
        std::fs::write(&path, "[7]").unwrap();

        let document = JsonDocument::<u32>::open_or_init(&path, || vec![1])
            .await
            .unwrap();

        assert_eq!(document.read().await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.json");
        std::fs::write(&path, "{ not json").unwrap();

        let document = JsonDocument::<u32>::open_or_init(&path, Vec::new)
            .await
            .unwrap();

        assert!(matches!(
            document.read().await,
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_read_skips_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.json");
        std::fs::write(&path, "garbage").unwrap();

        let document = JsonDocument::<u32>::open_or_init(&path, Vec::new)
            .await
            .unwrap();
        let result = document.update(|records| records.push(1)).await;

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_write_is_pretty_printed_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.json");

        let document = JsonDocument::<u32>::open_or_init(&path, Vec::new)
            .await
            .unwrap();
        document.replace(&[4, 5]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[\n  4,\n  5\n]");
        assert!(!dir.path().join("numbers.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.json");

        let document = std::sync::Arc::new(
            JsonDocument::<u32>::open_or_init(&path, Vec::new)
                .await
                .unwrap(),
        );

        let tasks: Vec<_> = (0..20)
            .map(|n| {
                let document = std::sync::Arc::clone(&document);
                tokio::spawn(async move { document.update(|records| records.push(n)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let mut records = document.read().await.unwrap();
        records.sort_unstable();
        assert_eq!(records, (0..20).collect::<Vec<_>>());
    }
}
