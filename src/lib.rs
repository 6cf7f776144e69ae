//! Caching edge proxy library.
//!
//! Resolves each request against a redirect store, then an object store,
//! then the origin, populating both stores from origin responses.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod pipeline;
pub mod storage;

pub use config::EdgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Outcome, Pipeline, PipelineSettings};
