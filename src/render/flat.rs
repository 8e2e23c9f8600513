//! Flat JSON lines with a fixed key set.

use serde::Serialize;

use crate::event::{Event, Value};
use crate::render::{RenderError, Renderer};

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Serialize)]
struct FlatLine<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    date: Option<String>,
    level: &'static str,
    channel: Option<&'a Value>,
    message: &'a str,
}

/// Renders `{"type", "date", "level", "channel", "message"}`; other fields
/// are not written.
#[derive(Debug, Clone)]
pub struct FlatJsonRenderer {
    logger_type: String,
}

impl FlatJsonRenderer {
    pub fn new(logger_type: impl Into<String>) -> Self {
        Self {
            logger_type: logger_type.into(),
        }
    }
}

impl Renderer for FlatJsonRenderer {
    fn render(&self, event: &Event) -> Result<String, RenderError> {
        let line = FlatLine {
            kind: &self.logger_type,
            date: event.timestamp.map(|ts| ts.format(DATE_FORMAT).to_string()),
            level: event.level.as_str(),
            channel: event.field("channel"),
            message: &event.message,
        };
        Ok(serde_json::to_string(&line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;

    #[test]
    fn test_flat_keys() {
        let mut ev = Event::new("base".into(), Level::Info, "this is info.");
        ev.fields.insert("channel".into(), Value::from("test"));
        ev.fields.insert("ignored".into(), Value::from(1));

        let out = FlatJsonRenderer::new("pa_access").render(&ev).unwrap();
        assert_eq!(
            out,
            r#"{"type":"pa_access","date":null,"level":"INFO","channel":"test","message":"this is info."}"#
        );
    }
}
