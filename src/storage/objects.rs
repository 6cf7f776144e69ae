//! Cached body persistence.

use std::sync::Arc;

use bytes::Bytes;

use super::{HttpMetadata, ObjectStore};
use crate::observability::metrics;

const STORE: &str = "objects";

/// A cached origin body and the content type it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedObject {
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Object lookups and best-effort writes over an [`ObjectStore`].
#[derive(Clone)]
pub struct ObjectCache {
    store: Arc<dyn ObjectStore>,
}

impl ObjectCache {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Look up a cached body. Store errors read as a miss.
    pub async fn get(&self, key: &str) -> Option<CachedObject> {
        match self.store.get(key).await {
            Ok(Some(object)) => {
                metrics::record_store_lookup(STORE, "hit");
                Some(CachedObject {
                    body: object.body,
                    content_type: object.http_metadata.content_type,
                })
            }
            Ok(None) => {
                metrics::record_store_lookup(STORE, "miss");
                None
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Object lookup failed, treating as miss");
                metrics::record_store_lookup(STORE, "error");
                None
            }
        }
    }

    /// Persist a body. Failures are logged and otherwise ignored.
    pub async fn put(&self, key: &str, body: Bytes, content_type: Option<String>) {
        let size = body.len();
        match self
            .store
            .put(key, body, HttpMetadata { content_type })
            .await
        {
            Ok(()) => {
                tracing::debug!(cache_key = %key, size, "Object stored");
                metrics::record_store_write(STORE, true);
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Failed to store object");
                metrics::record_store_write(STORE, false);
            }
        }
    }
}
