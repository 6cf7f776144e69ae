//! Structured logging.
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies, and the
//! `debug` flag raises this crate to `debug` so every pipeline decision is logged.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Default filter directives for the given config.
pub fn default_directives(config: &ObservabilityConfig) -> String {
    if config.debug {
        "edge_cache_proxy=debug,tower_http=debug".to_string()
    } else {
        format!("edge_cache_proxy={0},tower_http={0}", config.log_level)
    }
}

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}
