//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::LoggingConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<LoggingConfig, ConfigError> {
    let config: LoggingConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LoggingConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderFormat;
    use crate::sink::SinkTarget;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [environment]
            variable = "APP_ENV"

            [[loggers]]
            name = "svc"
            level = "WARNING"
            channel = "access"
            format = "json"
            target = { kind = "stderr" }

            [[loggers]]
            name = "audit"
            format = "flat"
            target = { kind = "file", path = "logs/audit.log" }
            non_blocking = true

            [server]
            bind_address = "0.0.0.0:8000"
            "#,
        )
        .unwrap();

        assert_eq!(config.environment.variable, "APP_ENV");
        assert_eq!(config.environment.development_value, "development");
        assert_eq!(config.loggers.len(), 2);
        assert_eq!(config.loggers[0].channel.as_deref(), Some("access"));
        assert_eq!(config.loggers[0].format, Some(RenderFormat::Json));
        assert_eq!(
            config.loggers[1].target,
            Some(SinkTarget::File { path: "logs/audit.log".into() })
        );
        assert_eq!(config.server.bind_address, "0.0.0.0:8000");
    }

    #[test]
    fn test_validation_error_surfaces() {
        let err = parse_config("[[loggers]]\nname = \"svc\"\nlevel = \"chatty\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
