//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, apply EDGE_* env overrides)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable for the process lifetime)
//!     → consumed by startup to build the pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CacheConfig, EdgeConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    OriginConfig, StorageBackend, StorageConfig,
};
