//! Exception capture around fallible and panicking code.

use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe, Location};

use crate::event::{ExceptionRecord, Level};
use crate::logger::Logger;

const CAUGHT_MESSAGE: &str = "An error has been caught";

/// What happens to a captured failure after it has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Hand the failure back to the caller.
    Reraise,
    /// Swallow it.
    Suppress,
}

impl Logger {
    /// Run `f`; if it fails, log the error at ERROR and return it unchanged.
    #[track_caller]
    pub fn catch<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + 'static,
    {
        let location = Location::caller();
        f().inspect_err(|err| self.record_error(err, location))
    }

    /// Run `f`; if it fails, log the error at ERROR and return `None`.
    #[track_caller]
    pub fn catch_suppress<T, E, F>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, E>,
        E: StdError + 'static,
    {
        let location = Location::caller();
        match f() {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_error(&err, location);
                None
            }
        }
    }

    /// Run `f`, logging a panic at ERROR. With [`CaptureMode::Reraise`] the
    /// panic then resumes; with [`CaptureMode::Suppress`] `None` is returned.
    #[track_caller]
    pub fn catch_unwind<T, F>(&self, mode: CaptureMode, f: F) -> Option<T>
    where
        F: FnOnce() -> T,
    {
        let location = Location::caller();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => Some(value),
            Err(payload) => {
                if self.enabled(Level::Error) {
                    self.at_location(Level::Error, CAUGHT_MESSAGE, location)
                        .exception_record(ExceptionRecord::from_panic(payload.as_ref()))
                        .emit();
                }
                match mode {
                    CaptureMode::Reraise => panic::resume_unwind(payload),
                    CaptureMode::Suppress => None,
                }
            }
        }
    }

    fn record_error<E>(&self, err: &E, location: &'static Location<'static>)
    where
        E: StdError + 'static,
    {
        self.at_location(Level::Error, CAUGHT_MESSAGE, location)
            .exception(err)
            .emit();
    }
}
