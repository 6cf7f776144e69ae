//! Startup orchestration.
//!
//! Builds the process-wide [`Pipeline`] from a validated config: store
//! backends first, then the origin client, then the settings.

use std::sync::Arc;

use axum::http::uri::InvalidUri;
use thiserror::Error;

use crate::config::{EdgeConfig, StorageBackend};
use crate::origin::HttpOrigin;
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::storage::{
    FsKvStore, FsObjectStore, KvStore, MemoryKvStore, MemoryObjectStore, ObjectCache, ObjectStore,
    RedirectStore,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid origin address: {0}")]
    Origin(#[from] InvalidUri),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Redirect and object store handles for the configured backend.
pub fn build_stores(config: &EdgeConfig) -> (RedirectStore, ObjectCache) {
    let (kv, objects): (Arc<dyn KvStore>, Arc<dyn ObjectStore>) = match config.storage.backend {
        StorageBackend::Memory => (
            Arc::new(MemoryKvStore::new()),
            Arc::new(MemoryObjectStore::new()),
        ),
        StorageBackend::Filesystem => (
            Arc::new(FsKvStore::new(&config.storage.root)),
            Arc::new(FsObjectStore::new(&config.storage.root)),
        ),
    };

    tracing::info!(backend = ?config.storage.backend, root = %config.storage.root, "Stores initialized");
    (RedirectStore::new(kv), ObjectCache::new(objects))
}

/// Build the resolution pipeline described by `config`.
pub fn build_pipeline(config: &EdgeConfig) -> Result<Pipeline, StartupError> {
    let (redirects, objects) = build_stores(config);
    let origin = HttpOrigin::new(&config.origin)?;

    tracing::info!(
        origin = %config.origin.address,
        enabled = config.origin.enabled,
        follow_redirects = config.origin.follow_redirects,
        "Origin configured"
    );

    Ok(Pipeline::new(
        redirects,
        objects,
        Arc::new(origin),
        PipelineSettings::from_config(config),
    ))
}
