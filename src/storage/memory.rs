//! In-process store backends.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::{HttpMetadata, KvStore, ObjectStore, StoreError, StoredObject};

/// A thread-safe key-value store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }
}

/// A thread-safe object store held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<DashMap<String, (Bytes, HttpMetadata)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError> {
        Ok(self.inner.get(key).map(|r| {
            let (body, http_metadata) = r.value();
            StoredObject {
                body: body.clone(),
                http_metadata: http_metadata.clone(),
            }
        }))
    }

    async fn put(&self, key: &str, body: Bytes, metadata: HttpMetadata) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), (body, metadata));
        Ok(())
    }
}
