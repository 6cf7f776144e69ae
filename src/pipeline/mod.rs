//! Request resolution pipeline.
//!
//! # Data Flow
//! ```text
//! Request<Bytes>
//!     → key.rs        (host + path + query)
//!     → classifier.rs (non-cacheable prefixes)
//!     → resolver.rs   (redirect store → object store → origin)
//!     → Resolved { outcome, response }
//! ```
//!
//! # Design Decisions
//! - Exactly one terminal response per request
//! - Store failures degrade to the next state, never to an error response
//! - No single-flight: concurrent misses for one key each fetch and store
//! - HTTP method is not part of the key

pub mod classifier;
pub mod key;
pub mod resolver;
pub mod stats;

pub use classifier::PathClassifier;
pub use key::CacheKey;
pub use resolver::{Outcome, Pipeline, PipelineSettings, Resolved};
pub use stats::PipelineStats;
