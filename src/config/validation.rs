//! Configuration validation.
//!
//! Semantic checks run after serde has parsed the file. All problems are
//! collected, not just the first one.

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::{uri::Authority, HeaderValue};
use thiserror::Error;

use crate::config::schema::{EdgeConfig, StorageBackend, PLACEHOLDER_API_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address `{value}`")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("bypass prefix `{0}` must start with '/'")]
    BypassPrefix(String),

    #[error("cache_control `{0}` is not a valid header value")]
    CacheControl(String),

    #[error("storage root must not be empty for the filesystem backend")]
    StorageRoot,

    #[error("admin api_key must be set when the admin API is enabled")]
    AdminKey,

    #[error("admin api_key is still the shipped placeholder")]
    PlaceholderAdminKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SocketAddr::from_str(&config.listener.bind_address).is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("listener.max_body_bytes"));
    }

    if config.origin.enabled {
        if Authority::from_str(&config.origin.address).is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "origin.address",
                value: config.origin.address.clone(),
            });
        }
        if config.origin.timeout_secs == 0 {
            errors.push(ValidationError::Zero("origin.timeout_secs"));
        }
        if config.origin.max_body_bytes == 0 {
            errors.push(ValidationError::Zero("origin.max_body_bytes"));
        }
    }

    for prefix in &config.cache.bypass_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::BypassPrefix(prefix.clone()));
        }
    }
    if HeaderValue::from_str(&config.cache.cache_control).is_err() {
        errors.push(ValidationError::CacheControl(config.cache.cache_control.clone()));
    }

    if config.storage.backend == StorageBackend::Filesystem && config.storage.root.trim().is_empty() {
        errors.push(ValidationError::StorageRoot);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }

    if config.observability.metrics_enabled
        && SocketAddr::from_str(&config.observability.metrics_address).is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::AdminKey);
        } else if config.admin.api_key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::PlaceholderAdminKey);
        }
        if SocketAddr::from_str(&config.admin.bind_address).is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
