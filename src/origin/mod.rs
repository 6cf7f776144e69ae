//! Origin server access.
//!
//! # Data Flow
//! ```text
//! pipeline (cache miss or bypass)
//!     → client.rs   (HttpOrigin: rewrite URI, forward, buffer body, follow redirects)
//!     → OriginResponse
//!     → classify.rs (redirect / cacheable / pass-through)
//! ```
//!
//! # Design Decisions
//! - Bodies are buffered: a cacheable body must be stored and returned
//! - Timeouts belong to the origin client, not the pipeline
//! - Transport errors never reach the client verbatim

pub mod classify;
pub mod client;

use async_trait::async_trait;
use axum::http::{HeaderMap, Request, StatusCode};
use bytes::Bytes;
use thiserror::Error;

pub use classify::{classify, Classification};
pub use client::HttpOrigin;

/// Transport-level failure talking to the origin.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("origin request could not be built: {0}")]
    Request(#[from] axum::http::Error),

    #[error("origin unreachable: {0}")]
    Transport(String),

    #[error("origin timed out after {0} seconds")]
    Timeout(u64),

    #[error("failed to read origin body: {0}")]
    Body(String),
}

/// A redirect the origin client followed on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowedRedirect {
    /// Final URL after following.
    pub url: String,
    /// Status of the first redirect hop.
    pub status: StatusCode,
}

/// A fully buffered origin response.
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub followed: Option<FollowedRedirect>,
}

impl OriginResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            followed: None,
        }
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// The client followed at least one redirect to produce this response.
    pub fn redirected(&self) -> bool {
        self.followed.is_some()
    }

    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Upstream transport used by the pipeline.
#[async_trait]
pub trait Origin: Send + Sync {
    /// Fetch for a cacheable path. Implementations may follow redirects and
    /// report them through [`OriginResponse::followed`].
    async fn fetch(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError>;

    /// Forward a single exchange untouched. Redirects are never followed, so
    /// the client sees exactly what the origin answered.
    async fn forward(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError>;
}
