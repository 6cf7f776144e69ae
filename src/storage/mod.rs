//! Redirect and object storage.
//!
//! # Data Flow
//! ```text
//! pipeline
//!     → redirects.rs (RedirectStore: JSON records over a KvStore)
//!     → objects.rs   (ObjectCache: bodies + content type over an ObjectStore)
//!         → memory.rs (DashMap, process local)
//!         → fs.rs     (files under a root directory)
//! ```
//!
//! # Design Decisions
//! - Backends are opaque get/put dictionaries; no eviction happens here
//! - Adapters never return errors: failed reads are misses, failed writes are logged
//! - Concurrent writes to one key resolve as last-write-wins in the backend

pub mod fs;
pub mod memory;
pub mod objects;
pub mod redirects;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fs::{FsKvStore, FsObjectStore};
pub use memory::{MemoryKvStore, MemoryObjectStore};
pub use objects::{CachedObject, ObjectCache};
pub use redirects::{RedirectRecord, RedirectStore};

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed stored data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// HTTP metadata stored alongside an object body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpMetadata {
    pub content_type: Option<String>,
}

/// An object as returned by an [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Bytes,
    pub http_metadata: HttpMetadata,
}

/// String-valued key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;
}

/// Binary object store with per-object HTTP metadata.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StoreError>;

    async fn put(&self, key: &str, body: Bytes, metadata: HttpMetadata) -> Result<(), StoreError>;
}
