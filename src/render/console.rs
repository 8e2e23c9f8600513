//! Colorized console output.

use std::fmt::Write as _;

use owo_colors::OwoColorize;

use crate::event::{Event, Level};
use crate::render::{RenderError, Renderer};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LEVEL_WIDTH: usize = 8;
const MESSAGE_WIDTH: usize = 30;

/// Human-readable line: timestamp, level, call site, message, fields.
#[derive(Debug, Clone)]
pub struct ConsoleRenderer {
    colors: bool,
}

impl ConsoleRenderer {
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    fn level(&self, level: Level, label: &str) -> String {
        let padded = format!("{:<width$}", label, width = LEVEL_WIDTH);
        if !self.colors {
            return padded;
        }
        match level {
            Level::Debug => padded.green().to_string(),
            Level::Info => padded.bright_green().to_string(),
            Level::Warning => padded.yellow().to_string(),
            Level::Error => padded.red().to_string(),
            Level::Critical => padded.on_red().bold().to_string(),
        }
    }

    fn paint_dim(&self, text: &str) -> String {
        if self.colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&self, event: &Event) -> Result<String, RenderError> {
        let mut line = String::new();

        if let Some(ts) = &event.timestamp {
            let _ = write!(line, "{} ", self.paint_dim(&ts.format(TIME_FORMAT).to_string()));
        }

        let label = event.level_label.unwrap_or_else(|| event.level.label());
        let _ = write!(line, "[{}] ", self.level(event.level, label));

        if let Some(callsite) = &event.callsite {
            let mut site = format!("{}:{}", callsite.file, callsite.line);
            if let Some(function) = &callsite.function {
                let _ = write!(site, " {}", function);
            }
            let _ = write!(site, " [{}]", callsite.thread);
            let _ = write!(line, "{} ", self.paint_dim(&site));
        }

        let message = format!("{:<width$}", event.message, width = MESSAGE_WIDTH);
        if self.colors {
            let _ = write!(line, "{}", message.bold());
        } else {
            line.push_str(&message);
        }

        for (key, value) in &event.fields {
            if self.colors {
                let _ = write!(line, " {}={}", key.cyan(), value.magenta());
            } else {
                let _ = write!(line, " {}={}", key, value);
            }
        }

        let line = line.trim_end().to_string();
        let mut out = line;

        if let Some(stack) = &event.stack {
            let _ = write!(out, "\nStack (most recent call first):\n{}", stack.trim_end());
        }

        match (&event.exc_text, &event.exception) {
            (Some(text), _) => {
                let _ = write!(out, "\n{}", text.trim_end());
            }
            (None, Some(exception)) => {
                let _ = write!(out, "\n{}", exception.summary());
            }
            (None, None) => {}
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Callsite, ExceptionRecord, Value};

    fn event() -> Event {
        let mut ev = Event::new("test".into(), Level::Warning, "disk almost full");
        ev.level_label = Some("warning");
        ev.fields.insert("channel".into(), Value::from("audit"));
        ev.callsite = Some(Callsite {
            file: "src/app.rs".into(),
            line: 12,
            function: Some("app::check".into()),
            thread: "main".into(),
        });
        ev
    }

    #[test]
    fn test_plain_layout() {
        let out = ConsoleRenderer::new(false).render(&event()).unwrap();
        assert!(out.starts_with("[warning ] src/app.rs:12 app::check [main] disk almost full"));
        assert!(out.ends_with("channel=audit"));
    }

    #[test]
    fn test_colors_emit_ansi() {
        let out = ConsoleRenderer::new(true).render(&event()).unwrap();
        assert!(out.contains("\x1b["));
        assert!(out.contains("disk almost full"));
    }

    #[test]
    fn test_exception_summary_without_detail_stage() {
        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let mut ev = event();
        ev.exception = Some(ExceptionRecord::from_error(&Boom));
        let out = ConsoleRenderer::new(false).render(&ev).unwrap();
        assert!(out.lines().nth(1).unwrap().starts_with("Boom: boom"));
    }
}
