//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Level names parse, logger names are present and unique
//! - File targets name a file, server values are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoggingConfig → Result<(), Vec<ValidationError>>
//! - Runs before any logger of the file is installed

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::LoggingConfig;
use crate::event::Level;
use crate::sink::SinkTarget;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("environment variable name is empty")]
    EmptyEnvironmentVariable,

    #[error("logger #{index} has an empty name")]
    EmptyLoggerName { index: usize },

    #[error("logger {name:?} is configured more than once")]
    DuplicateLogger { name: String },

    #[error("logger {name:?} has invalid level {level:?}")]
    InvalidLevel { name: String, level: String },

    #[error("logger {name:?} has a file target without a file name")]
    InvalidFilePath { name: String },

    #[error("server bind address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("server max_body_bytes must be greater than zero")]
    ZeroBodyLimit,
}

pub fn validate_config(config: &LoggingConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.environment.variable.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironmentVariable);
    }

    let mut seen = HashSet::new();
    for (index, logger) in config.loggers.iter().enumerate() {
        let name = logger.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyLoggerName { index });
        } else if !seen.insert(name.to_string()) {
            errors.push(ValidationError::DuplicateLogger {
                name: name.to_string(),
            });
        }

        if logger.level.parse::<Level>().is_err() {
            errors.push(ValidationError::InvalidLevel {
                name: logger.name.clone(),
                level: logger.level.clone(),
            });
        }

        if let Some(SinkTarget::File { path }) = &logger.target {
            if path.file_name().is_none() {
                errors.push(ValidationError::InvalidFilePath {
                    name: logger.name.clone(),
                });
            }
        }
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LoggerConfig;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&LoggingConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = LoggingConfig::default();
        config.loggers.push(LoggerConfig {
            name: "svc".into(),
            level: "loud".into(),
            ..LoggerConfig::default()
        });
        config.loggers.push(LoggerConfig {
            name: "svc".into(),
            target: Some(SinkTarget::File { path: "/".into() }),
            ..LoggerConfig::default()
        });
        config.server.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidLevel {
                    name: "svc".into(),
                    level: "loud".into()
                },
                ValidationError::DuplicateLogger { name: "svc".into() },
                ValidationError::InvalidFilePath { name: "svc".into() },
                ValidationError::ZeroBodyLimit,
            ]
        );
    }
}
