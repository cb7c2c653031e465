//! Filesystem-backed object store
//!
//! Objects live at `<root>/<bucket>/<key>`, with key segments mapped to
//! directories. A failed copy or commit may leave a truncated file behind.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::ObjectStore;
use crate::StorageError;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
    bucket: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    /// Directory holding this store's objects
    pub fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    /// Resolve `key` to a path inside the bucket directory
    ///
    /// Keys must be relative, with no empty, `.` or `..` segments.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = || StorageError::InvalidKey(key.to_string());

        if key
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return Err(invalid());
        }
        let rel = Path::new(key);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(invalid());
        }

        Ok(self.bucket_dir().join(rel))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, payload: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&path).await?;
        let mut reader = payload;
        tokio::io::copy(&mut reader, &mut file).await?;

        // Closing the writer commits the object
        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(path = %path.display(), "object committed to disk");
        Ok(())
    }
}
