//! Event model.
//!
//! # Data Flow
//! ```text
//! Logger::at(level, message)
//!     → EventBuilder (fields, lazy values, exception)
//!     → level filter (lazy values evaluated only past this point)
//!     → Event
//!     → pipeline stages → renderer → sink
//! ```
//!
//! # Design Decisions
//! - Field values are a closed set so every renderer can serialize them
//! - Exceptions are reduced to type, message and a traceback flag

pub mod exception;
pub mod lazy;
pub mod level;
pub mod record;
pub mod value;

pub use exception::ExceptionRecord;
pub use lazy::LazyValue;
pub use level::Level;
pub use record::{format_message, Callsite, Event};
pub use value::{fields, Fields, Value};
