//! The request resolution state machine.
//!
//! ```text
//! cache key
//!   → non-cacheable path?  → forward to origin (no redirect following), return verbatim
//!   → redirect record?     → redirect
//!   → cached object?       → 200 from the object store
//!   → origin disabled?     → 404
//!   → fetch origin         → classify → (store in background) → respond
//! ```
//!
//! Each step short-circuits. Store writes are spawned onto the pipeline's
//! [`BackgroundTasks`] and never influence the response already chosen.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use bytes::Bytes;

use super::classifier::PathClassifier;
use super::key::CacheKey;
use super::stats::PipelineStats;
use crate::config::schema::{EdgeConfig, DEFAULT_CACHE_CONTROL};
use crate::http::response;
use crate::lifecycle::BackgroundTasks;
use crate::origin::{classify, Classification, Origin};
use crate::storage::{ObjectCache, RedirectRecord, RedirectStore};

/// Terminal state a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Non-cacheable path forwarded to the origin.
    Bypass,
    /// Served from the redirect store.
    RedirectHit,
    /// Served from the object store.
    CacheHit,
    /// Origin disabled and nothing stored.
    Disabled,
    /// Origin answered with a redirect, now remembered.
    OriginRedirect,
    /// Origin answered 2xx, body now stored.
    OriginCached,
    /// Origin answer returned without storing.
    OriginPassThrough,
    /// Origin could not be reached.
    OriginError,
}

impl Outcome {
    pub const ALL: [Outcome; 8] = [
        Outcome::Bypass,
        Outcome::RedirectHit,
        Outcome::CacheHit,
        Outcome::Disabled,
        Outcome::OriginRedirect,
        Outcome::OriginCached,
        Outcome::OriginPassThrough,
        Outcome::OriginError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Bypass => "bypass",
            Outcome::RedirectHit => "redirect_hit",
            Outcome::CacheHit => "cache_hit",
            Outcome::Disabled => "disabled",
            Outcome::OriginRedirect => "origin_redirect",
            Outcome::OriginCached => "origin_cached",
            Outcome::OriginPassThrough => "origin_pass_through",
            Outcome::OriginError => "origin_error",
        }
    }
}

/// A request's single terminal response.
#[derive(Debug)]
pub struct Resolved {
    pub outcome: Outcome,
    pub response: Response<Body>,
}

/// Process-wide flags the pipeline consults.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub backend_enabled: bool,
    pub cache_control: HeaderValue,
    pub classifier: PathClassifier,
}

impl PipelineSettings {
    pub fn from_config(config: &EdgeConfig) -> Self {
        let cache_control = HeaderValue::from_str(&config.cache.cache_control)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CACHE_CONTROL));

        Self {
            backend_enabled: config.origin.enabled,
            cache_control,
            classifier: PathClassifier::new(config.cache.bypass_prefixes.iter().cloned()),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            backend_enabled: true,
            cache_control: HeaderValue::from_static(DEFAULT_CACHE_CONTROL),
            classifier: PathClassifier::default(),
        }
    }
}

/// Stores, origin and flags needed to resolve requests.
///
/// Built once per process and shared behind an `Arc`.
pub struct Pipeline {
    redirects: RedirectStore,
    objects: ObjectCache,
    origin: Arc<dyn Origin>,
    settings: PipelineSettings,
    background: BackgroundTasks,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn new(
        redirects: RedirectStore,
        objects: ObjectCache,
        origin: Arc<dyn Origin>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            redirects,
            objects,
            origin,
            settings,
            background: BackgroundTasks::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn redirects(&self) -> &RedirectStore {
        &self.redirects
    }

    pub fn objects(&self) -> &ObjectCache {
        &self.objects
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Store writes still in flight.
    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Resolve one request to its response.
    pub async fn resolve(&self, request: Request<Bytes>) -> Resolved {
        let key = CacheKey::from_request(&request);
        tracing::debug!(cache_key = %key, method = %request.method(), "Handling request");

        let (outcome, response) = if self.settings.classifier.is_non_cacheable(request.uri().path()) {
            self.bypass(request, &key).await
        } else {
            self.resolve_cacheable(request, key).await
        };

        self.stats.record(outcome);
        Resolved { outcome, response }
    }

    async fn bypass(&self, request: Request<Bytes>, key: &CacheKey) -> (Outcome, Response<Body>) {
        if !self.settings.backend_enabled {
            tracing::debug!(cache_key = %key, "Non-cacheable path with origin disabled");
            return (Outcome::Disabled, response::not_found());
        }

        tracing::debug!(cache_key = %key, "Non-cacheable path, forwarding to origin");
        match self.origin.forward(request).await {
            Ok(origin) => (Outcome::Bypass, response::from_origin(origin, None)),
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Fetch error");
                (Outcome::OriginError, response::internal_error())
            }
        }
    }

    async fn resolve_cacheable(&self, request: Request<Bytes>, key: CacheKey) -> (Outcome, Response<Body>) {
        if let Some(record) = self.redirects.get(key.as_str()).await {
            if let Some(status) = record.status_code() {
                tracing::debug!(cache_key = %key, target = %record.target, "Redirect found");
                return (Outcome::RedirectHit, response::redirect(&record.target, status));
            }
        }

        if let Some(object) = self.objects.get(key.as_str()).await {
            tracing::debug!(cache_key = %key, size = object.body.len(), "Cache hit");
            return (
                Outcome::CacheHit,
                response::cached(object.body, object.content_type.as_deref(), &self.settings.cache_control),
            );
        }

        tracing::debug!(cache_key = %key, "Cache miss");

        if !self.settings.backend_enabled {
            tracing::debug!(cache_key = %key, "Content not found");
            return (Outcome::Disabled, response::not_found());
        }

        self.fetch_and_store(request, key).await
    }

    async fn fetch_and_store(&self, request: Request<Bytes>, key: CacheKey) -> (Outcome, Response<Body>) {
        let origin = match self.origin.fetch(request).await {
            Ok(origin) => origin,
            Err(e) => {
                tracing::error!(cache_key = %key, error = %e, "Fetch error");
                return (Outcome::OriginError, response::internal_error());
            }
        };

        // Bypassed paths never get here.
        match classify(&origin, true) {
            Classification::Redirect { target, status } => {
                tracing::debug!(cache_key = %key, target = %target, status = %status, "New redirect detected");
                let record = RedirectRecord::new(target.clone(), status);
                let redirects = self.redirects.clone();
                self.background.spawn("store_redirect", async move {
                    redirects.put(key.as_str(), &record).await;
                });
                (Outcome::OriginRedirect, response::redirect(&target, status))
            }
            Classification::Cacheable => {
                tracing::debug!(cache_key = %key, "Caching content");
                let objects = self.objects.clone();
                let body = origin.body.clone();
                let content_type = origin.content_type();
                self.background.spawn("store_object", async move {
                    objects.put(key.as_str(), body, content_type).await;
                });
                (
                    Outcome::OriginCached,
                    response::from_origin(origin, Some(&self.settings.cache_control)),
                )
            }
            Classification::PassThrough => {
                tracing::debug!(cache_key = %key, status = %origin.status, "Origin response not cacheable");
                (
                    Outcome::OriginPassThrough,
                    response::from_origin(origin, Some(&self.settings.cache_control)),
                )
            }
        }
    }
}
