//! Forward `tracing` events into a configured logger.
//!
//! # Responsibilities
//! - Map `tracing` levels onto [`Level`]
//! - Turn the `message` field into the event message, other fields into
//!   event fields
//! - Use event metadata as the call site
//!
//! # Design Decisions
//! - Only events are forwarded; span fields are not merged
//! - Events emitted by this crate are skipped so a failing sink cannot feed
//!   its own diagnostics back into itself

use std::fmt;

use tracing::field::{Field, Visit};
use tracing::{Metadata, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::event::{Callsite, Event, Fields, Level, Value};
use crate::logger::Logger;

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");
const OWN_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// A `tracing_subscriber` layer writing through a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerLayer {
    logger: Logger,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn accepts(&self, metadata: &Metadata<'_>) -> bool {
        let target = metadata.target();
        target != OWN_TARGET
            && !target.starts_with(OWN_PREFIX)
            && self.logger.enabled(Level::from(metadata.level()))
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.is_event() || !self.accepts(metadata) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let level = Level::from(metadata.level());
        let mut record = Event::new(
            self.logger.name().into(),
            level,
            visitor.message.unwrap_or_default(),
        );
        record.fields = visitor.fields;
        record.function = metadata.module_path().map(str::to_string);
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            let current = std::thread::current();
            record.callsite = Some(Callsite {
                file: file.to_string(),
                line,
                function: record.function.clone(),
                thread: current
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{:?}", current.id())),
            });
        }

        self.logger.emit_event(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{:?}", value)));
    }
}
