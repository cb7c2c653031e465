//! In-process object store

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use super::ObjectStore;
use crate::StorageError;

/// Keeps objects in a map; used for tests and local smoke runs
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Contents of an object, if written
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).cloned()
    }

    /// All keys in lexical order
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(&self, key: &str, payload: &[u8]) -> Result<(), StorageError> {
        self.objects
            .write()
            .insert(key.to_string(), payload.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = MemoryObjectStore::new("b");
        assert!(store.is_empty());

        store.put("k", b"one").await.unwrap();
        store.put("k", b"two").await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k"), Some(b"two".to_vec()));
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }
}
