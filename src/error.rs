//! Crate-wide error type.

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors returned by configuration calls.
///
/// Emission never returns an error: once a logger is configured, write
/// failures are reported through internal diagnostics and the event is
/// dropped.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed level, empty logger name or an unsupported option combination.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The output destination could not be opened.
    #[error("failed to open {target} sink")]
    Sink {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Loading a configuration file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
