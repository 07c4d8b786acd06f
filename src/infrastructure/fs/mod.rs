//! Filesystem Blob Store
//!
//! Archives raw-event JSON objects as files under a root directory, with
//! the time-partitioned archive key as the relative path.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{BlobStore, SinkError};

/// Blob store writing objects to the local filesystem.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created on first write, not here.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path an archive key maps to.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, body: &[u8]) -> Result<(), SinkError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| SinkError::BlobStore(format!("mkdir {}: {err}", parent.display())))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|err| SinkError::BlobStore(format!("write {}: {err}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_object_under_partition_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let key = "year=2024/month=01/day=01/AAPL-2024-01-01T00:00:00+00:00.json";
        store.put(key, br#"{"symbol":"AAPL"}"#).await.unwrap();

        let written = std::fs::read(dir.path().join(key)).unwrap();
        assert_eq!(written, br#"{"symbol":"AAPL"}"#);
    }

    #[tokio::test]
    async fn overwrites_existing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("k.json", b"old").await.unwrap();
        store.put("k.json", b"new").await.unwrap();

        let written = std::fs::read(dir.path().join("k.json")).unwrap();
        assert_eq!(written, b"new");
    }
}
