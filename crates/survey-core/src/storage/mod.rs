//! Object storage for submitted answers
//!
//! Every accepted submission becomes exactly one object, written once under a
//! key derived from the current UTC minute and the respondent identifier:
//!
//! ```text
//! <bucket>/
//! └── 2020/04/01/12/30/
//!     ├── respondent-1
//!     └── respondent-2
//! ```
//!
//! Keys are not checked for collisions and objects are never updated or
//! deleted. Backends implement [`ObjectStore`]; [`ObjectWriter`] bounds each
//! write with a timeout and never retries.

pub mod gcs;
pub mod local;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::StorageError;

pub use gcs::{GcsObjectStore, TokenSource};
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

/// Upper bound on a single object write
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(50);

/// A bucket-scoped object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket every key is written under
    fn bucket(&self) -> &str;

    /// Open a writer for `key`, copy `payload` into it and commit
    async fn put(&self, key: &str, payload: &[u8]) -> Result<(), StorageError>;
}

/// Storage key for an object written at `now` by respondent `id`
///
/// The timestamp part is `YYYY/MM/DD/HH/MM/` in UTC; `id` is appended as-is.
pub fn object_key(now: DateTime<Utc>, id: &str) -> String {
    format!("{}{}", now.format("%Y/%m/%d/%H/%M/"), id)
}

/// Timeout-bounded front for an [`ObjectStore`]
#[derive(Clone)]
pub struct ObjectWriter {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl ObjectWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            timeout: WRITE_TIMEOUT,
        }
    }

    /// Override the write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Write `payload` under `key`
    ///
    /// The write is abandoned once the timeout elapses. Whatever the backend
    /// had already committed at that point is left in place.
    pub async fn write(&self, key: &str, payload: &[u8]) -> Result<(), StorageError> {
        match tokio::time::timeout(self.timeout, self.store.put(key, payload)).await {
            Ok(Ok(())) => {
                tracing::info!(
                    bucket = self.store.bucket(),
                    key,
                    bytes = payload.len(),
                    "object written"
                );
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for ObjectWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("bucket", &self.store.bucket())
            .field("timeout", &self.timeout)
            .finish()
    }
}
