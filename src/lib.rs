//! Environment-aware structured logging.
//!
//! One call configures a named logger: the `ENV` variable selects either a
//! colorized developer console pipeline or a JSON pipeline for machines.
//! Handles carry bound fields, pick up ambient request context, and defer
//! expensive arguments until the level filter has passed.

pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod http;
pub mod logger;
pub mod pipeline;
pub mod render;
pub mod sink;

pub use bridge::LoggerLayer;
pub use config::LoggingConfig;
pub use error::{Error, Result};
pub use event::{fields, ExceptionRecord, Fields, Level, Value};
pub use logger::{configure_logger, CaptureMode, EventBuilder, Logger, LoggerBuilder, LoggerRegistry};
pub use pipeline::{EnvironmentMode, PipelineSpec, Processor};
pub use render::RenderFormat;
pub use sink::{Delivery, SinkTarget};
