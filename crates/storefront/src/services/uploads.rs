//! Product image storage.
//!
//! Uploaded images are written to the uploads directory under a generated
//! name (`<unix-millis><.ext>`, extension taken from the client's file name)
//! and referenced by products as `/uploads/<file>`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

/// URL prefix under which uploaded files are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Longest extension kept from a client file name.
const MAX_EXTENSION_LEN: usize = 10;

/// Errors raised when an uploaded file cannot be stored.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The uploads directory could not be created.
    #[error("failed to create upload directory {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be written.
    #[error("failed to store upload {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory of uploaded product images.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the uploads directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Directory` if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| UploadError::Directory {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    /// Directory the files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` and return the reference path (`/uploads/<file>`).
    ///
    /// Names are never reused: when two uploads land in the same
    /// millisecond the later one takes the next free timestamp.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Write` if the file cannot be created or written.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let extension = extension_of(original_name);
        let mut stamp = chrono::Utc::now().timestamp_millis();

        loop {
            let file_name = format!("{stamp}{extension}");
            let path = self.dir.join(&file_name);

            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;

            match file {
                Ok(mut file) => {
                    let written = async {
                        file.write_all(bytes).await?;
                        file.flush().await
                    }
                    .await;
                    if let Err(source) = written {
                        let _ = tokio::fs::remove_file(&path).await;
                        return Err(UploadError::Write { path, source });
                    }

                    info!(file = %file_name, "Stored upload");
                    return Ok(format!("{UPLOADS_ROUTE}/{file_name}"));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => stamp += 1,
                Err(source) => return Err(UploadError::Write { path, source }),
            }
        }
    }

    /// Delete a file previously returned by [`UploadStore::save`].
    ///
    /// References outside the uploads route are ignored. Failures are logged,
    /// not returned.
    pub async fn remove(&self, reference: &str) {
        let Some(file_name) = reference
            .strip_prefix(UPLOADS_ROUTE)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            warn!(reference, "Not an upload reference; nothing removed");
            return;
        };

        let path = self.dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(file = %file_name, "Removed upload"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// `.ext` of a client file name, or empty when it has none or it looks unsafe.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("cow.jpg"), ".jpg");
        assert_eq!(extension_of("photo.final.PNG"), ".PNG");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("weird.j$g"), "");
        assert_eq!(extension_of("../../etc/passwd"), "");
        assert_eq!(extension_of(""), "");
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path().join("uploads")).await.unwrap();
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).await.unwrap();

        let reference = store.save("milk.jpeg", b"jpeg-bytes").await.unwrap();

        let file_name = reference.strip_prefix("/uploads/").unwrap();
        assert!(file_name.ends_with(".jpeg"));
        let stem = file_name.trim_end_matches(".jpeg");
        assert!(stem.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            std::fs::read(dir.path().join(file_name)).unwrap(),
            b"jpeg-bytes"
        );
    }

    #[tokio::test]
    async fn test_remove_deletes_saved_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).await.unwrap();

        let reference = store.save("milk.png", b"png").await.unwrap();
        store.remove(&reference).await;

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_references() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path().join("uploads")).await.unwrap();
        std::fs::write(dir.path().join("products.json"), "[]").unwrap();

        store.remove("/uploads/../products.json").await;
        store.remove("https://cdn.example/milk.png").await;

        assert!(dir.path().join("products.json").exists());
    }

    #[tokio::test]
    async fn test_same_millisecond_uploads_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::open(dir.path()).await.unwrap();

        let mut references = Vec::new();
        for n in 0..5u8 {
            references.push(store.save("a.png", &[n]).await.unwrap());
        }
        references.sort();
        references.dedup();
        assert_eq!(references.len(), 5);
    }
}
