//! JSON output for log aggregation.
//!
//! One compact object per line:
//!
//! ```text
//! {"text": "...", "record": {"extra": {...}, "time": "...", "exception": null, ...}}
//! ```

use serde::Serialize;

use crate::event::{Event, ExceptionRecord, Fields};
use crate::render::{RenderError, Renderer};

#[derive(Serialize)]
struct Line<'a> {
    text: &'a str,
    record: Record<'a>,
}

#[derive(Serialize)]
struct Record<'a> {
    extra: &'a Fields,
    time: Option<String>,
    exception: Option<&'a ExceptionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'static str>,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, event: &Event) -> Result<String, RenderError> {
        let callsite = event.callsite.as_ref();
        let line = Line {
            text: &event.message,
            record: Record {
                extra: &event.fields,
                time: event.timestamp.map(|ts| ts.to_rfc3339()),
                exception: event.exception.as_ref(),
                level: event.level_label,
                name: &event.logger,
                file: callsite.map(|c| c.file.as_str()),
                function: callsite.and_then(|c| c.function.as_deref()),
                line: callsite.map(|c| c.line),
                thread: callsite.map(|c| c.thread.as_str()),
                stack: event.stack.as_deref(),
            },
        };
        Ok(serde_json::to_string(&line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Level, Value};
    use chrono::Local;

    #[test]
    fn test_record_shape() {
        let mut ev = Event::new("svc".into(), Level::Warning, "slow request");
        ev.fields.insert("channel".into(), Value::from("access"));
        ev.timestamp = Some(Local::now());
        ev.level_label = Some("warning");

        let out = JsonRenderer.render(&ev).unwrap();
        assert!(!out.contains('\n'));

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["text"], "slow request");
        assert_eq!(json["record"]["extra"]["channel"], "access");
        assert!(json["record"]["time"].is_string());
        assert!(json["record"]["exception"].is_null());
        assert_eq!(json["record"]["level"], "warning");
        assert!(json["record"].get("file").is_none());
    }

    #[test]
    fn test_exception_is_reduced() {
        #[derive(Debug, thiserror::Error)]
        #[error("division by zero")]
        struct ZeroDivisionError;

        let mut ev = Event::new("svc".into(), Level::Error, "failed");
        ev.exception = Some(ExceptionRecord::from_error(&ZeroDivisionError));

        let json: serde_json::Value =
            serde_json::from_str(&JsonRenderer.render(&ev).unwrap()).unwrap();
        let exception = json["record"]["exception"].as_object().unwrap();
        assert_eq!(exception.len(), 3);
        assert_eq!(exception["type"], "ZeroDivisionError");
        assert_eq!(exception["value"], "division by zero");
        assert_eq!(exception["traceback"], true);
    }
}
