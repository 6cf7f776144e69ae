//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! proxy. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Path prefixes that are never cached (administrative/control endpoints).
pub const DEFAULT_BYPASS_PREFIXES: &[&str] = &[
    "/wp-admin",
    "/wp-login.php",
    "/wp-json",
    "/xmlrpc.php",
    "/wp-cron.php",
    "/wp-comments-post.php",
];

/// Cache-Control value advertised on cached and freshly fetched responses.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=3600";

/// Shipped admin key. Refused when the admin API is enabled.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the edge proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Upstream origin settings.
    pub origin: OriginConfig,

    /// Cacheability rules.
    pub cache: CacheConfig,

    /// Redirect and object store backends.
    pub storage: StorageConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum buffered size of an inbound request body.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Forward cache misses to the origin. When false, misses answer 404.
    pub enabled: bool,

    /// Origin address (e.g., "127.0.0.1:8000").
    pub address: String,

    /// Deadline for a single origin exchange, body included, in seconds.
    pub timeout_secs: u64,

    /// Let the origin client follow redirects itself.
    pub follow_redirects: bool,

    /// Maximum hops followed when `follow_redirects` is on.
    pub max_redirects: usize,

    /// Maximum buffered size of an origin response body.
    pub max_body_bytes: usize,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:8000".to_string(),
            timeout_secs: 30,
            follow_redirects: false,
            max_redirects: 5,
            max_body_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Cacheability rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Request path prefixes forwarded to the origin untouched.
    pub bypass_prefixes: Vec<String>,

    /// Value of the injected Cache-Control header.
    pub cache_control: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bypass_prefixes: DEFAULT_BYPASS_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }
}

/// Which implementation backs the redirect and object stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Filesystem,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation.
    pub backend: StorageBackend,

    /// Root directory for the filesystem backend.
    pub root: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            root: "./edge-data".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Debug logging for the resolution pipeline.
    pub debug: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: PLACEHOLDER_API_KEY.to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Shutdown behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long pending background store writes may run after the listener closes.
    pub drain_timeout_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: 30,
        }
    }
}
