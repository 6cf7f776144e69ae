//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build stores + origin → Pipeline → Start listeners
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → Stop accepting → Drain in-flight requests → Drain background writes → Exit
//!
//! Background work (background.rs):
//!     Store writes detached from responses, tracked until complete
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)
//! - Background drain has a deadline

pub mod background;
pub mod shutdown;
pub mod startup;

pub use background::BackgroundTasks;
pub use shutdown::Shutdown;
pub use startup::{build_pipeline, StartupError};
