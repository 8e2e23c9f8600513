//! Logger handles and event builders.

use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::event::{format_message, Event, ExceptionRecord, Fields, LazyValue, Level, Value};
use crate::pipeline::Pipeline;

/// The registry cell a handle reads its current pipeline from.
pub(crate) type Slot = Arc<ArcSwap<Pipeline>>;

/// A handle for emitting events through a named pipeline.
///
/// Handles are cheap to clone and can be shared across threads. Every
/// emission loads the pipeline currently registered under the handle's name,
/// so reconfiguring a name takes effect for existing handles immediately.
#[derive(Clone)]
pub struct Logger {
    name: Arc<str>,
    slot: Slot,
    bound: Arc<Fields>,
}

impl Logger {
    pub(crate) fn new(name: Arc<str>, slot: Slot, bound: Fields) -> Self {
        Self {
            name,
            slot,
            bound: Arc::new(bound),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields attached to every event from this handle.
    pub fn bound(&self) -> &Fields {
        &self.bound
    }

    /// Derive a child handle with additional permanent fields.
    ///
    /// The parent is not modified; equal keys are overridden in the child only.
    pub fn bind<I, K, V>(&self, pairs: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bound = (*self.bound).clone();
        for (k, v) in pairs {
            bound.insert(k.into(), v.into());
        }
        Logger {
            name: self.name.clone(),
            slot: self.slot.clone(),
            bound: Arc::new(bound),
        }
    }

    /// Whether an event at `level` passes the current pipeline's filter.
    pub fn enabled(&self, level: Level) -> bool {
        self.slot.load().enabled(level)
    }

    /// Start building an event.
    ///
    /// The message is a template only when the call adds fields: `{key}`
    /// is replaced by the field and `{{`/`}}` write a literal brace. A
    /// message without call fields is written exactly as given.
    #[track_caller]
    pub fn at(&self, level: Level, message: impl Into<String>) -> EventBuilder<'_> {
        self.at_location(level, message, Location::caller())
    }

    pub(crate) fn at_location(
        &self,
        level: Level,
        message: impl Into<String>,
        location: &'static Location<'static>,
    ) -> EventBuilder<'_> {
        EventBuilder {
            logger: self,
            level,
            message: message.into(),
            fields: Fields::new(),
            lazy: Vec::new(),
            exception: None,
            stack_requested: false,
            function: None,
            location,
        }
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.at(level, message).emit()
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.at(Level::Debug, message).emit()
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.at(Level::Info, message).emit()
    }

    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.at(Level::Warning, message).emit()
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.at(Level::Error, message).emit()
    }

    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.at(Level::Critical, message).emit()
    }

    /// Emit an ERROR event carrying `err` as its exception record.
    #[track_caller]
    pub fn exception<E>(&self, message: impl Into<String>, err: &E)
    where
        E: StdError + 'static,
    {
        self.at(Level::Error, message).exception(err).emit()
    }

    /// Send an already assembled event through the current pipeline.
    ///
    /// Bound fields are added underneath the event's own fields.
    pub fn emit_event(&self, mut event: Event) {
        let pipeline = self.slot.load();
        if !pipeline.enabled(event.level) {
            return;
        }
        for (key, value) in self.bound.iter() {
            event
                .fields
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        pipeline.process(event);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("bound", &self.bound)
            .finish()
    }
}

/// An event under construction. Nothing is evaluated or written until
/// [`emit`](EventBuilder::emit), and only if the level passes the filter.
#[must_use = "events are only written by `emit`"]
pub struct EventBuilder<'a> {
    logger: &'a Logger,
    level: Level,
    message: String,
    fields: Fields,
    lazy: Vec<(String, LazyValue)>,
    exception: Option<ExceptionRecord>,
    stack_requested: bool,
    function: Option<String>,
    location: &'static Location<'static>,
}

impl<'a> EventBuilder<'a> {
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn fields<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.fields.insert(k.into(), v.into());
        }
        self
    }

    /// A field computed only if the event is written.
    pub fn lazy<F, V>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> V + Send + 'static,
        V: Into<Value>,
    {
        self.lazy.push((key.into(), LazyValue::new(f)));
        self
    }

    /// A fallible lazy field; an `Err` is written in place of the value.
    pub fn try_lazy<F, V, E>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        V: Into<Value>,
        E: fmt::Display,
    {
        self.lazy.push((key.into(), LazyValue::fallible(f)));
        self
    }

    /// Attach an error. Its backtrace is captured only if the level is enabled.
    pub fn exception<E>(mut self, err: &E) -> Self
    where
        E: StdError + 'static,
    {
        if self.logger.enabled(self.level) {
            self.exception = Some(ExceptionRecord::from_error(err));
        }
        self
    }

    pub fn exception_record(mut self, record: ExceptionRecord) -> Self {
        self.exception = Some(record);
        self
    }

    /// Ask the pipeline to attach the current stack.
    pub fn stack_info(mut self) -> Self {
        self.stack_requested = true;
        self
    }

    /// Name reported as the call-site function.
    pub fn function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    pub fn emit(self) {
        let pipeline = self.logger.slot.load();
        if !pipeline.enabled(self.level) {
            return;
        }

        let mut call_fields = self.fields;
        for (key, lazy) in self.lazy {
            call_fields.insert(key, lazy.evaluate());
        }
        let message = if call_fields.is_empty() {
            self.message
        } else {
            format_message(&self.message, &call_fields)
        };

        let mut fields = (*self.logger.bound).clone();
        fields.extend(call_fields);

        let mut event = Event::new(self.logger.name.clone(), self.level, message);
        event.fields = fields;
        event.location = Some(self.location);
        event.function = self.function;
        event.exception = self.exception;
        event.stack_requested = self.stack_requested;

        pipeline.process(event);
    }
}

/// Emit an event with `key = value` fields, recording the calling module as
/// the call-site function.
///
/// ```ignore
/// envlog::log!(logger, Level::Info, "user {user} logged in", user = "alice", ip = ip);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger
                .at(level, $msg)
                .function(module_path!())
                $(.field(stringify!($key), $value))*
                .emit();
        }
    }};
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($rest:tt)+) => { $crate::log!($logger, $crate::Level::Debug, $($rest)+) };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($rest:tt)+) => { $crate::log!($logger, $crate::Level::Info, $($rest)+) };
}

#[macro_export]
macro_rules! warning {
    ($logger:expr, $($rest:tt)+) => { $crate::log!($logger, $crate::Level::Warning, $($rest)+) };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($rest:tt)+) => { $crate::log!($logger, $crate::Level::Error, $($rest)+) };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr, $($rest:tt)+) => { $crate::log!($logger, $crate::Level::Critical, $($rest)+) };
}
