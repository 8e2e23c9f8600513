//! Event renderers.
//!
//! # Responsibilities
//! - Turn a fully processed event into one output line
//! - Console: colorized human-readable text for development
//! - Json: `text`/`record` objects for log aggregation
//! - Flat: `type`/`date`/`level`/`channel`/`message` objects
//!
//! # Design Decisions
//! - Renderers never add information; stages do
//! - Output excludes the trailing newline; the sink appends it

pub mod console;
pub mod flat;
pub mod json;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

pub use console::ConsoleRenderer;
pub use flat::FlatJsonRenderer;
pub use json::JsonRenderer;

/// Rendering failed; the event is dropped.
#[derive(Debug, Error)]
#[error("failed to render event: {0}")]
pub struct RenderError(#[from] serde_json::Error);

/// Final pipeline step.
pub trait Renderer: Send + Sync {
    fn render(&self, event: &Event) -> Result<String, RenderError>;
}

/// Which renderer a pipeline ends with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    Console,
    Json,
    Flat,
}
