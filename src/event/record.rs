//! The event flowing through a pipeline.

use std::panic::Location;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::event::exception::ExceptionRecord;
use crate::event::level::Level;
use crate::event::value::{Fields, Value};

/// Where an event was emitted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callsite {
    pub file: String,
    pub line: u32,
    pub function: Option<String>,
    pub thread: String,
}

/// A single log event.
///
/// The emitting handle fills the first group of fields; pipeline stages fill
/// the annotations (`level_label` onwards) before the renderer runs.
#[derive(Debug, Clone)]
pub struct Event {
    pub logger: Arc<str>,
    pub level: Level,
    pub message: String,
    pub fields: Fields,
    pub location: Option<&'static Location<'static>>,
    pub function: Option<String>,
    pub exception: Option<ExceptionRecord>,
    pub stack_requested: bool,

    pub level_label: Option<&'static str>,
    pub timestamp: Option<DateTime<Local>>,
    pub callsite: Option<Callsite>,
    pub stack: Option<String>,
    pub exc_text: Option<String>,
}

impl Event {
    pub fn new(logger: Arc<str>, level: Level, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: Fields::new(),
            location: None,
            function: None,
            exception: None,
            stack_requested: false,
            level_label: None,
            timestamp: None,
            callsite: None,
            stack: None,
            exc_text: None,
        }
    }

    /// Look up a field, e.g. the `channel` bound by the facade.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Substitute `{key}` placeholders from `fields`.
///
/// `{{` and `}}` produce literal braces; placeholders without a matching
/// field are kept as written.
pub fn format_message(template: &str, fields: &Fields) -> String {
    if !template.contains('{') && !template.contains('}') {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            match tail.find('}') {
                Some(end) => {
                    let key = &tail[1..end];
                    match fields.get(key) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => out.push_str(&tail[..=end]),
                    }
                    rest = &tail[end + 1..];
                }
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
