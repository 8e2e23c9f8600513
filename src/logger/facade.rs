//! The configuration facade.
//!
//! # Responsibilities
//! - Validate the request (name, level)
//! - Read the environment indicator once per call
//! - Select the pipeline for the resulting mode and apply overrides
//! - Open the sink, then hand the finished pipeline to the registry
//!
//! # Design Decisions
//! - Everything fallible happens before the registry is touched
//! - An injected mode skips the environment lookup entirely

use std::io::Write;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriter;

use crate::config::{EnvironmentConfig, LoggerConfig};
use crate::error::{Error, Result};
use crate::event::{Fields, Level, Value};
use crate::logger::handle::Logger;
use crate::logger::registry::LoggerRegistry;
use crate::pipeline::{EnvironmentMode, Pipeline, PipelineSpec, Processor};
use crate::render::RenderFormat;
use crate::sink::{Sink, SinkTarget};

/// Configure `name` from the `ENV` environment variable.
///
/// `minimum_level` defaults to INFO; `channel`, when given, is bound to the
/// returned handle as the `channel` field.
pub fn configure_logger(
    registry: &LoggerRegistry,
    name: &str,
    minimum_level: Option<&str>,
    channel: Option<&str>,
) -> Result<Logger> {
    let mut builder = LoggerBuilder::new(name);
    if let Some(level) = minimum_level {
        builder = builder.level(level);
    }
    if let Some(channel) = channel {
        builder = builder.channel(channel);
    }
    registry.configure(builder)
}

/// Full set of options for one logger.
pub struct LoggerBuilder {
    config: LoggerConfig,
    environment: EnvironmentConfig,
    mode: Option<EnvironmentMode>,
    sink: Option<Sink>,
    processors: Vec<Arc<dyn Processor>>,
}

/// A validated, fully built logger waiting to be installed.
pub(crate) struct PreparedLogger {
    pub name: String,
    pub mode: EnvironmentMode,
    pub pipeline: Pipeline,
    pub bound: Fields,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: LoggerConfig {
                name: name.into(),
                ..LoggerConfig::default()
            },
            environment: EnvironmentConfig::default(),
            mode: None,
            sink: None,
            processors: Vec::new(),
        }
    }

    pub fn from_config(config: &LoggerConfig, environment: &EnvironmentConfig) -> Self {
        Self {
            config: config.clone(),
            environment: environment.clone(),
            mode: None,
            sink: None,
            processors: Vec::new(),
        }
    }

    /// Minimum level by name; validated when the logger is configured.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.config.channel = Some(channel.into());
        self
    }

    /// Environment variable holding the indicator (default `ENV`).
    pub fn env_var(mut self, variable: impl Into<String>) -> Self {
        self.environment.variable = variable.into();
        self
    }

    /// Indicator value meaning development (default `development`).
    pub fn development_value(mut self, value: impl Into<String>) -> Self {
        self.environment.development_value = value.into();
        self
    }

    /// Use `mode` instead of reading the environment.
    pub fn mode(mut self, mode: EnvironmentMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn format(mut self, format: RenderFormat) -> Self {
        self.config.format = Some(format);
        self
    }

    pub fn target(mut self, target: SinkTarget) -> Self {
        self.config.target = Some(target);
        self
    }

    pub fn non_blocking(mut self, enabled: bool) -> Self {
        self.config.non_blocking = Some(enabled);
        self
    }

    pub fn colors(mut self, enabled: bool) -> Self {
        self.config.colors = Some(enabled);
        self
    }

    /// Value of the `type` key in flat output.
    pub fn logger_type(mut self, logger_type: impl Into<String>) -> Self {
        self.config.logger_type = logger_type.into();
        self
    }

    /// Write synchronously to `make_writer` instead of the mode's target.
    pub fn writer<M>(mut self, make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.sink = Some(Sink::from_make_writer(make_writer));
        self
    }

    /// Write to `writer` from a background worker instead of the mode's target.
    pub fn queued_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        self.sink = Some(Sink::non_blocking(writer));
        self
    }

    /// Append a stage after the built-in ones.
    pub fn processor<P>(mut self, processor: P) -> Self
    where
        P: Processor + 'static,
    {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn configure(self, registry: &LoggerRegistry) -> Result<Logger> {
        registry.configure(self)
    }

    pub(crate) fn prepare(self) -> Result<PreparedLogger> {
        let name = self.config.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidConfiguration(
                "logger name must not be empty".to_string(),
            ));
        }
        let level: Level = self.config.level.parse()?;

        let mode = self.mode.unwrap_or_else(|| {
            EnvironmentMode::from_env(
                &self.environment.variable,
                &self.environment.development_value,
            )
        });
        let spec = self.config.apply(PipelineSpec::for_mode(mode));

        let sink = match self.sink {
            Some(sink) => sink,
            None => Sink::open(&spec.target, spec.delivery)?,
        };
        let pipeline = Pipeline::new(spec, level, self.processors, sink);

        let mut bound = Fields::new();
        if let Some(channel) = self.config.channel {
            bound.insert("channel".to_string(), Value::String(channel));
        }

        Ok(PreparedLogger {
            name,
            mode,
            pipeline,
            bound,
        })
    }
}
