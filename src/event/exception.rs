//! Reduced exception records.

use std::any::Any;
use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt::Write as _;

use serde::Serialize;

/// The serializable part of a captured error: its type name, its message and
/// whether a backtrace was available.
///
/// `detail` holds the full source chain and backtrace. Only the console
/// renderer prints it; it is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionRecord {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub value: String,
    pub traceback: bool,
    #[serde(skip)]
    pub detail: Option<String>,
}

impl ExceptionRecord {
    /// Record a typed error; the type name is the last path segment of `E`.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + 'static,
    {
        Self::capture(Some(short_type_name::<E>()), err)
    }

    /// Record an error whose concrete type is erased (`type` serializes as null).
    pub fn from_dyn(err: &(dyn StdError + 'static)) -> Self {
        Self::capture(None, err)
    }

    fn capture(type_name: Option<String>, err: &(dyn StdError + 'static)) -> Self {
        let backtrace = Backtrace::force_capture();
        let traceback = matches!(
            backtrace.status(),
            std::backtrace::BacktraceStatus::Captured
        );
        let detail = render_detail(type_name.as_deref(), err, &backtrace.to_string());
        Self {
            type_name,
            value: err.to_string(),
            traceback,
            detail: Some(detail),
        }
    }

    /// Record a panic payload caught by `catch_unwind`.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let value = panic_message(payload);
        let backtrace = Backtrace::force_capture();
        let traceback = matches!(
            backtrace.status(),
            std::backtrace::BacktraceStatus::Captured
        );
        Self {
            type_name: Some("panic".to_string()),
            detail: Some(format!("panic: {}\n{}", value, backtrace)),
            value,
            traceback,
        }
    }

    /// One-line summary, `Type: message`.
    pub fn summary(&self) -> String {
        match &self.type_name {
            Some(name) => format!("{}: {}", name, self.value),
            None => self.value.clone(),
        }
    }
}

/// `alloc::string::String` -> `String`, `a::Wrapper<b::C>` -> `Wrapper`.
pub(crate) fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn render_detail(type_name: Option<&str>, err: &(dyn StdError + 'static), backtrace: &str) -> String {
    let mut out = String::new();
    match type_name {
        Some(name) => {
            let _ = write!(out, "{}: {}", name, err);
        }
        None => {
            let _ = write!(out, "{}", err);
        }
    }
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {}", cause);
        source = cause.source();
    }
    if !backtrace.is_empty() {
        let _ = write!(out, "\nBacktrace:\n{}", backtrace);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer(#[source] Inner);

    #[derive(Debug, thiserror::Error)]
    #[error("inner failure")]
    struct Inner;

    #[test]
    fn test_type_name_is_short() {
        let record = ExceptionRecord::from_error(&Inner);
        assert_eq!(record.type_name.as_deref(), Some("Inner"));
        assert_eq!(record.value, "inner failure");
        assert!(record.traceback);
    }

    #[test]
    fn test_detail_includes_chain() {
        let record = ExceptionRecord::from_error(&Outer(Inner));
        let detail = record.detail.unwrap();
        assert!(detail.starts_with("Outer: outer failure"));
        assert!(detail.contains("Caused by: inner failure"));
    }

    #[test]
    fn test_serialized_shape() {
        let record = ExceptionRecord::from_dyn(&Inner);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["type"].is_null());
        assert_eq!(json["value"], "inner failure");
        assert_eq!(json["traceback"], true);
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_panic_payload() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        let record = ExceptionRecord::from_panic(payload.as_ref());
        assert_eq!(record.summary(), "panic: boom");
    }
}
