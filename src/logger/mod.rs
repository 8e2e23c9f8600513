//! Logger configuration and handles.
//!
//! # Data Flow
//! ```text
//! configure_logger / LoggerBuilder
//!     → facade.rs (validate, read ENV, PipelineSpec, open sink)
//!     → registry.rs (swap the named slot)
//!     → handle.rs (Logger bound to the slot + channel)
//!
//! Logger::info(..) / EventBuilder::emit
//!     → load slot → level filter → lazy values → pipeline
//! ```
//!
//! # Design Decisions
//! - One slot per name; configuring again swaps the pipeline atomically
//! - Handles never own a pipeline, only the slot, so there is no stale copy
//! - Binding clones the field map; parents are never mutated

pub mod catch;
pub mod facade;
pub mod handle;
pub mod registry;

pub use catch::CaptureMode;
pub use facade::{configure_logger, LoggerBuilder};
pub use handle::{EventBuilder, Logger};
pub use registry::LoggerRegistry;
