//! Built-in pipeline stages.

use std::backtrace::Backtrace;

use chrono::Local;

use crate::context;
use crate::event::{Callsite, Event};

/// One transformation applied to every event before rendering.
///
/// Implemented for plain closures, so ad-hoc stages such as adding the
/// process id can be registered without a named type.
pub trait Processor: Send + Sync {
    fn process(&self, event: &mut Event);
}

impl<F> Processor for F
where
    F: Fn(&mut Event) + Send + Sync,
{
    fn process(&self, event: &mut Event) {
        self(event)
    }
}

/// Merge ambient context fields; fields already on the event win.
#[derive(Debug, Default)]
pub struct MergeContextVars;

impl Processor for MergeContextVars {
    fn process(&self, event: &mut Event) {
        for (key, value) in context::get_contextvars() {
            event.fields.entry(key).or_insert(value);
        }
    }
}

/// Attach the lower-case level label.
#[derive(Debug, Default)]
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn process(&self, event: &mut Event) {
        event.level_label = Some(event.level.label());
    }
}

/// Capture the current stack when the event asked for it.
#[derive(Debug, Default)]
pub struct StackInfo;

impl Processor for StackInfo {
    fn process(&self, event: &mut Event) {
        if event.stack_requested && event.stack.is_none() {
            event.stack = Some(Backtrace::force_capture().to_string());
        }
    }
}

/// Expand an attached exception into its full chain and backtrace text.
#[derive(Debug, Default)]
pub struct ExcInfo;

impl Processor for ExcInfo {
    fn process(&self, event: &mut Event) {
        if let Some(exception) = &event.exception {
            let text = exception
                .detail
                .clone()
                .unwrap_or_else(|| exception.summary());
            event.exc_text = Some(text);
        }
    }
}

/// Stamp the event with the local time.
#[derive(Debug, Default)]
pub struct TimeStamper;

impl Processor for TimeStamper {
    fn process(&self, event: &mut Event) {
        event.timestamp = Some(Local::now());
    }
}

/// Attach file, function, line and thread name.
#[derive(Debug, Default)]
pub struct CallsiteParameters;

impl Processor for CallsiteParameters {
    fn process(&self, event: &mut Event) {
        let Some(location) = event.location else {
            return;
        };
        let current = std::thread::current();
        let thread = current
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", current.id()));

        event.callsite = Some(Callsite {
            file: location.file().to_string(),
            line: location.line(),
            function: event.function.clone(),
            thread,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ExceptionRecord, Level, Value};
    use std::panic::Location;

    fn event() -> Event {
        Event::new("test".into(), Level::Info, "hello")
    }

    #[test]
    fn test_merge_keeps_event_fields() {
        context::clear_contextvars();
        context::bind_contextvars([("user", "ambient"), ("request_id", "r-1")]);

        let mut ev = event();
        ev.fields.insert("user".into(), Value::from("explicit"));
        MergeContextVars.process(&mut ev);

        assert_eq!(ev.fields["user"], Value::from("explicit"));
        assert_eq!(ev.fields["request_id"], Value::from("r-1"));
        context::clear_contextvars();
    }

    #[test]
    fn test_stack_only_on_demand() {
        let mut ev = event();
        StackInfo.process(&mut ev);
        assert!(ev.stack.is_none());

        ev.stack_requested = true;
        StackInfo.process(&mut ev);
        assert!(ev.stack.is_some());
    }

    #[test]
    fn test_exc_info_expands_detail() {
        #[derive(Debug, thiserror::Error)]
        #[error("disk full")]
        struct WriteError;

        let mut ev = event();
        ev.exception = Some(ExceptionRecord::from_error(&WriteError));
        ExcInfo.process(&mut ev);
        assert!(ev.exc_text.unwrap().starts_with("WriteError: disk full"));
    }

    #[test]
    fn test_callsite_from_location() {
        let mut ev = event();
        ev.location = Some(Location::caller());
        ev.function = Some("envlog::tests".into());
        CallsiteParameters.process(&mut ev);

        let callsite = ev.callsite.unwrap();
        assert!(callsite.file.ends_with("processors.rs"));
        assert_eq!(callsite.function.as_deref(), Some("envlog::tests"));
        assert!(!callsite.thread.is_empty());
    }

    #[test]
    fn test_closure_processor() {
        let add_pid = |ev: &mut Event| {
            ev.fields.insert("process_id".into(), Value::from(std::process::id()));
        };
        let mut ev = event();
        add_pid.process(&mut ev);
        assert!(ev.fields.contains_key("process_id"));
    }
}
