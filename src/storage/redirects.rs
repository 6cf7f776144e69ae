//! Redirect record persistence.

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

use super::KvStore;
use crate::observability::metrics;

const STORE: &str = "redirects";

/// A known redirect for a cache key, stored as `{"target": ..., "type": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    /// Absolute or relative URL the client is sent to.
    pub target: String,
    /// HTTP redirect status code.
    #[serde(rename = "type")]
    pub status: u16,
}

impl RedirectRecord {
    pub fn new(target: impl Into<String>, status: StatusCode) -> Self {
        Self {
            target: target.into(),
            status: status.as_u16(),
        }
    }

    /// The status to answer with, if it is one a redirect may carry.
    pub fn status_code(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status)
            .ok()
            .filter(|s| is_redirect_status(*s))
    }

    /// The target as a `Location` value, if it can be sent as one.
    pub fn location(&self) -> Option<HeaderValue> {
        if self.target.is_empty() {
            return None;
        }
        HeaderValue::from_str(&self.target).ok()
    }
}

/// Statuses accepted for a redirect response.
pub fn is_redirect_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Redirect lookups and best-effort writes over a [`KvStore`].
///
/// Lookups never fail: unreachable stores, undecodable JSON, records with a
/// non-redirect status and targets that are not valid `Location` values all
/// read as "no redirect".
#[derive(Clone)]
pub struct RedirectStore {
    kv: Arc<dyn KvStore>,
}

impl RedirectStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn get(&self, key: &str) -> Option<RedirectRecord> {
        let raw = match self.kv.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::record_store_lookup(STORE, "miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Redirect lookup failed, treating as miss");
                metrics::record_store_lookup(STORE, "error");
                return None;
            }
        };

        let record: RedirectRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Malformed redirect record, treating as miss");
                metrics::record_store_lookup(STORE, "error");
                return None;
            }
        };

        if record.status_code().is_none() {
            tracing::warn!(cache_key = %key, status = record.status, "Stored redirect has a non-redirect status, ignoring");
            metrics::record_store_lookup(STORE, "error");
            return None;
        }

        if record.location().is_none() {
            tracing::warn!(cache_key = %key, target = ?record.target, "Stored redirect target is not a valid Location, ignoring");
            metrics::record_store_lookup(STORE, "error");
            return None;
        }

        metrics::record_store_lookup(STORE, "hit");
        Some(record)
    }

    /// Persist a record. Failures are logged and otherwise ignored.
    pub async fn put(&self, key: &str, record: &RedirectRecord) {
        let value = match serde_json::to_string(record) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Failed to encode redirect record");
                metrics::record_store_write(STORE, false);
                return;
            }
        };

        match self.kv.put(key, value).await {
            Ok(()) => {
                tracing::debug!(cache_key = %key, target = %record.target, status = record.status, "Redirect stored");
                metrics::record_store_write(STORE, true);
            }
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Failed to store redirect");
                metrics::record_store_write(STORE, false);
            }
        }
    }
}
