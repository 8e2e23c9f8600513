//! Deferred field values.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::event::exception::panic_message;
use crate::event::value::Value;

type Thunk = Box<dyn FnOnce() -> Result<Value, String> + Send>;

/// A field value computed only when its event passes the level filter.
pub struct LazyValue {
    thunk: Thunk,
}

impl LazyValue {
    pub fn new<F, V>(f: F) -> Self
    where
        F: FnOnce() -> V + Send + 'static,
        V: Into<Value>,
    {
        Self {
            thunk: Box::new(move || Ok(f().into())),
        }
    }

    /// A fallible computation; an `Err` is reported in place of the value.
    pub fn fallible<F, V, E>(f: F) -> Self
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        V: Into<Value>,
        E: fmt::Display,
    {
        Self {
            thunk: Box::new(move || f().map(Into::into).map_err(|e| e.to_string())),
        }
    }

    /// Run the computation. Panics and errors become a descriptive string so
    /// the emitting call site never fails because of a log argument.
    pub fn evaluate(self) -> Value {
        let outcome = panic::catch_unwind(AssertUnwindSafe(self.thunk))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));

        match outcome {
            Ok(value) => value,
            Err(reason) => {
                tracing::warn!(reason = %reason, "Lazy log argument failed");
                Value::String(format!("<lazy evaluation failed: {}>", reason))
            }
        }
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LazyValue(..)")
    }
}
