//! Ambient context variables.
//!
//! # Responsibilities
//! - Hold fields attached to every event of a logical scope (e.g. a request)
//! - Provide clear/bind/unbind operations without touching logger handles
//!
//! # Design Decisions
//! - Inside [`scope`] the fields live in a tokio task-local and follow the
//!   task across `.await` points and worker threads
//! - Outside any scope they live in a thread-local
//! - The `MergeContextVars` stage reads them at emission time

use std::cell::RefCell;
use std::future::Future;

use crate::event::value::{Fields, Value};

tokio::task_local! {
    static TASK_CONTEXT: RefCell<Fields>;
}

thread_local! {
    static THREAD_CONTEXT: RefCell<Fields> = RefCell::new(Fields::new());
}

fn with_context<R>(f: impl FnOnce(&mut Fields) -> R) -> R {
    if TASK_CONTEXT.try_with(|_| ()).is_ok() {
        TASK_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
    } else {
        THREAD_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
    }
}

/// Bind fields into the current ambient context, overwriting equal keys.
pub fn bind_contextvars<I, K, V>(pairs: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    with_context(|ctx| {
        for (k, v) in pairs {
            ctx.insert(k.into(), v.into());
        }
    })
}

/// Remove the given keys from the current ambient context.
pub fn unbind_contextvars<I, K>(keys: I)
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    with_context(|ctx| {
        for key in keys {
            ctx.remove(key.as_ref());
        }
    })
}

/// Drop every ambient field.
pub fn clear_contextvars() {
    with_context(|ctx| ctx.clear())
}

/// Snapshot of the current ambient context.
pub fn get_contextvars() -> Fields {
    with_context(|ctx| ctx.clone())
}

/// Run `fut` with its own ambient context, starting from `initial`.
///
/// Fields bound inside the future do not leak into the caller's context.
pub fn scope<F>(initial: Fields, fut: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    TASK_CONTEXT.scope(RefCell::new(initial), fut)
}

/// Bind fields until the returned guard is dropped, then restore the
/// previous values of those keys.
pub fn bound_contextvars<I, K, V>(pairs: I) -> ContextGuard
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    let previous: Vec<(String, Option<Value>)> = with_context(|ctx| {
        pairs
            .into_iter()
            .map(|(k, v)| {
                let key = k.into();
                let old = ctx.insert(key.clone(), v.into());
                (key, old)
            })
            .collect()
    });
    ContextGuard { previous }
}

/// Restores ambient fields on drop. See [`bound_contextvars`].
#[must_use = "the fields are unbound as soon as the guard is dropped"]
pub struct ContextGuard {
    previous: Vec<(String, Option<Value>)>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = std::mem::take(&mut self.previous);
        with_context(|ctx| {
            for (key, old) in previous.into_iter().rev() {
                match old {
                    Some(value) => ctx.insert(key, value),
                    None => ctx.remove(&key),
                };
            }
        })
    }
}
