//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::pipeline::{default_logger_type, PipelineSpec, DEFAULT_ENV_VAR, DEVELOPMENT_SENTINEL};
use crate::render::RenderFormat;
use crate::sink::{Delivery, SinkTarget};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// How the runtime environment is detected.
    pub environment: EnvironmentConfig,

    /// Loggers configured at startup (and on every reload).
    pub loggers: Vec<LoggerConfig>,

    /// Demo HTTP endpoint settings.
    pub server: ServerConfig,
}

/// Environment detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Environment variable holding the indicator.
    pub variable: String,

    /// Indicator value that selects development output.
    pub development_value: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            variable: DEFAULT_ENV_VAR.to_string(),
            development_value: DEVELOPMENT_SENTINEL.to_string(),
        }
    }
}

/// One named logger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Registry key.
    pub name: String,

    /// Minimum level (debug, info, warning, error, critical).
    pub level: String,

    /// Label bound to every event as the `channel` field.
    pub channel: Option<String>,

    /// Renderer override; the environment decides when unset.
    pub format: Option<RenderFormat>,

    /// Destination override; the environment decides when unset.
    pub target: Option<SinkTarget>,

    /// Delivery override; the environment decides when unset.
    pub non_blocking: Option<bool>,

    /// Console colors override.
    pub colors: Option<bool>,

    /// `type` key of the flat format.
    pub logger_type: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
            level: "INFO".to_string(),
            channel: None,
            format: None,
            target: None,
            non_blocking: None,
            colors: None,
            logger_type: default_logger_type(),
        }
    }
}

impl LoggerConfig {
    /// Apply the explicit overrides on top of the mode's pipeline.
    pub fn apply(&self, mut spec: PipelineSpec) -> PipelineSpec {
        if let Some(format) = self.format {
            spec.format = format;
        }
        if let Some(target) = &self.target {
            spec.target = target.clone();
        }
        if let Some(non_blocking) = self.non_blocking {
            spec.delivery = if non_blocking {
                Delivery::NonBlocking
            } else {
                Delivery::Synchronous
            };
        }
        if let Some(colors) = self.colors {
            spec.colors = colors;
        }
        spec.logger_type = self.logger_type.clone();
        spec
    }
}

/// Demo HTTP endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind_address: String,

    /// Logger used by the endpoint; configured with defaults if absent.
    pub logger: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            logger: "demo".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EnvironmentMode;

    #[test]
    fn test_empty_config_defaults() {
        let config: LoggingConfig = toml::from_str("").unwrap();
        assert_eq!(config.environment.variable, "ENV");
        assert_eq!(config.environment.development_value, "development");
        assert!(config.loggers.is_empty());
        assert_eq!(config.server.logger, "demo");
    }

    #[test]
    fn test_overrides_apply() {
        let config = LoggerConfig {
            format: Some(RenderFormat::Flat),
            target: Some(SinkTarget::Stdout),
            non_blocking: Some(false),
            logger_type: "audit_log".into(),
            ..LoggerConfig::default()
        };
        let spec = config.apply(PipelineSpec::for_mode(EnvironmentMode::NonDevelopment));
        assert_eq!(spec.format, RenderFormat::Flat);
        assert_eq!(spec.target, SinkTarget::Stdout);
        assert_eq!(spec.delivery, Delivery::Synchronous);
        assert_eq!(spec.logger_type, "audit_log");
    }

    #[test]
    fn test_no_overrides_keeps_mode() {
        let spec = LoggerConfig::default().apply(PipelineSpec::for_mode(EnvironmentMode::Development));
        assert_eq!(spec, PipelineSpec::for_mode(EnvironmentMode::Development));
    }
}
