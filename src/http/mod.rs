//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace layers)
//!     → buffer request body
//!     → pipeline::Pipeline::resolve
//!     → response.rs (redirect / cached / origin / error responses)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeEdgeRequestId, X_REQUEST_ID};
pub use server::HttpServer;
