//! Local filesystem blob store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{BlobStoreError, Result};
use crate::key::BlobKey;
use crate::store::{BlobRef, BlobStore};

/// Default URL prefix under which the daemon serves the upload directory.
pub const DEFAULT_URL_PREFIX: &str = "/uploads";

/// Stores blobs as plain files in a single directory.
///
/// References are root-relative paths (`/uploads/<key>`); serving them is up to
/// the HTTP layer.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    /// Open (and create if missing) a blob directory. Safe to call on every startup.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
        })
    }

    /// Override the prefix used to build references.
    pub fn with_url_prefix(mut self, prefix: &str) -> Self {
        self.url_prefix = prefix.trim_end_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` to exactly `key`, failing if the file already exists.
    pub(crate) async fn put_key(&self, key: &BlobKey, data: &[u8]) -> Result<BlobRef> {
        let path = self.root.join(key.as_str());

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobStoreError::KeyCollision(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // never leave a truncated blob behind
            if let Err(remove_err) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %remove_err, "failed to remove partial blob");
            }
            return Err(e.into());
        }

        Ok(BlobRef {
            key: key.to_string(),
            reference: format!("{}/{}", self.url_prefix, key),
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, data: Bytes, content_type: &str) -> Result<BlobRef> {
        let key = BlobKey::generate(name);
        debug!(
            key = %key,
            size = data.len(),
            content_type = content_type,
            "writing blob to local disk"
        );
        self.put_key(&key, &data).await
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_relative_reference() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(temp_dir.path().join("uploads"))
            .await
            .unwrap();

        let blob = store
            .put("book.epub", Bytes::from_static(b"epub bytes"), "application/epub+zip")
            .await
            .unwrap();

        assert!(blob.key.ends_with(".epub"));
        assert_eq!(blob.reference, format!("/uploads/{}", blob.key));

        let on_disk = std::fs::read(store.root().join(&blob.key)).unwrap();
        assert_eq!(on_disk, b"epub bytes");
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().join("a").join("b");
        LocalBlobStore::open(&root).await.unwrap();
        LocalBlobStore::open(&root).await.unwrap();
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn test_existing_key_is_a_collision() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(temp_dir.path()).await.unwrap();
        let key = BlobKey::from_parts(1, 1, "a.pdf");

        store.put_key(&key, b"first").await.unwrap();
        let err = store.put_key(&key, b"second").await.unwrap_err();
        assert!(matches!(err, BlobStoreError::KeyCollision(k) if k == "1-1.pdf"));

        // original content untouched
        let on_disk = std::fs::read(temp_dir.path().join("1-1.pdf")).unwrap();
        assert_eq!(on_disk, b"first");
    }

    #[tokio::test]
    async fn test_custom_url_prefix() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::open(temp_dir.path())
            .await
            .unwrap()
            .with_url_prefix("/files/");
        let blob = store
            .put("c.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert!(blob.reference.starts_with("/files/"));
    }
}
