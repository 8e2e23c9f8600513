//! Processing pipelines.
//!
//! # Data Flow
//! ```text
//! EnvironmentMode
//!     → PipelineSpec::for_mode (pure: stages, format, target, delivery)
//!     → Pipeline::new (instantiate stages and renderer, attach opened sink)
//!
//! Event
//!     → enabled(level)?  (before lazy values and stages run)
//!     → stages in order → renderer → sink
//! ```
//!
//! # Design Decisions
//! - Mode selection is a pure function so it can be tested without
//!   touching process environment variables
//! - A pipeline without a sink is "detached" and drops everything

pub mod processors;

use std::fmt;
use std::sync::Arc;

use crate::event::{Event, Level};
use crate::render::{ConsoleRenderer, FlatJsonRenderer, JsonRenderer, RenderFormat, Renderer};
use crate::sink::{Delivery, Sink, SinkTarget};

pub use processors::{
    AddLogLevel, CallsiteParameters, ExcInfo, MergeContextVars, Processor, StackInfo, TimeStamper,
};

/// Default environment variable consulted by the facade.
pub const DEFAULT_ENV_VAR: &str = "ENV";

/// Value of the environment variable that selects development output.
pub const DEVELOPMENT_SENTINEL: &str = "development";

/// Runtime environment the pipeline is selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentMode {
    Development,
    NonDevelopment,
}

impl EnvironmentMode {
    /// Classify an indicator value; anything but `sentinel` is non-development.
    pub fn classify(indicator: Option<&str>, sentinel: &str) -> Self {
        match indicator {
            None => EnvironmentMode::Development,
            Some(value) if value == sentinel => EnvironmentMode::Development,
            Some(_) => EnvironmentMode::NonDevelopment,
        }
    }

    /// Read `var` from the process environment. An unset (or non-unicode)
    /// variable means development.
    pub fn from_env(var: &str, sentinel: &str) -> Self {
        let value = std::env::var(var).ok();
        Self::classify(value.as_deref(), sentinel)
    }
}

/// Built-in stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MergeContextVars,
    AddLogLevel,
    StackInfo,
    ExcInfo,
    TimeStamper,
    CallsiteParameters,
}

impl Stage {
    fn instantiate(self) -> Arc<dyn Processor> {
        match self {
            Stage::MergeContextVars => Arc::new(MergeContextVars),
            Stage::AddLogLevel => Arc::new(AddLogLevel),
            Stage::StackInfo => Arc::new(StackInfo),
            Stage::ExcInfo => Arc::new(ExcInfo),
            Stage::TimeStamper => Arc::new(TimeStamper),
            Stage::CallsiteParameters => Arc::new(CallsiteParameters),
        }
    }
}

/// Declarative description of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub stages: Vec<Stage>,
    pub format: RenderFormat,
    pub target: SinkTarget,
    pub delivery: Delivery,
    pub colors: bool,
    pub logger_type: String,
}

impl PipelineSpec {
    /// Map an environment mode to its pipeline.
    pub fn for_mode(mode: EnvironmentMode) -> Self {
        match mode {
            EnvironmentMode::Development => Self {
                stages: vec![
                    Stage::MergeContextVars,
                    Stage::AddLogLevel,
                    Stage::StackInfo,
                    Stage::ExcInfo,
                    Stage::TimeStamper,
                    Stage::CallsiteParameters,
                ],
                format: RenderFormat::Console,
                target: SinkTarget::Stdout,
                delivery: Delivery::Synchronous,
                colors: true,
                logger_type: default_logger_type(),
            },
            EnvironmentMode::NonDevelopment => Self {
                stages: vec![
                    Stage::MergeContextVars,
                    Stage::AddLogLevel,
                    Stage::StackInfo,
                    Stage::TimeStamper,
                    Stage::CallsiteParameters,
                ],
                format: RenderFormat::Json,
                target: SinkTarget::Stderr,
                delivery: Delivery::NonBlocking,
                colors: false,
                logger_type: default_logger_type(),
            },
        }
    }

    fn renderer(&self) -> Box<dyn Renderer> {
        match self.format {
            RenderFormat::Console => Box::new(ConsoleRenderer::new(self.colors)),
            RenderFormat::Json => Box::new(JsonRenderer),
            RenderFormat::Flat => Box::new(FlatJsonRenderer::new(self.logger_type.clone())),
        }
    }
}

pub(crate) fn default_logger_type() -> String {
    "pa_access".to_string()
}

/// An instantiated pipeline bound to one sink.
pub struct Pipeline {
    min_level: Level,
    spec: Option<PipelineSpec>,
    processors: Vec<Arc<dyn Processor>>,
    renderer: Option<Box<dyn Renderer>>,
    sink: Option<Sink>,
}

impl Pipeline {
    /// Instantiate `spec`. `extra` stages run after the built-in ones.
    pub fn new(
        spec: PipelineSpec,
        min_level: Level,
        extra: Vec<Arc<dyn Processor>>,
        sink: Sink,
    ) -> Self {
        let mut processors: Vec<Arc<dyn Processor>> =
            spec.stages.iter().map(|stage| stage.instantiate()).collect();
        processors.extend(extra);

        Self {
            min_level,
            renderer: Some(spec.renderer()),
            spec: Some(spec),
            processors,
            sink: Some(sink),
        }
    }

    /// A pipeline with no transport; every event is dropped.
    pub fn detached() -> Self {
        Self {
            min_level: Level::Critical,
            spec: None,
            processors: Vec::new(),
            renderer: None,
            sink: None,
        }
    }

    /// Whether an event at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        self.sink.is_some() && level >= self.min_level
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    pub fn spec(&self) -> Option<&PipelineSpec> {
        self.spec.as_ref()
    }

    /// Number of attached transports (0 or 1).
    pub fn transport_count(&self) -> usize {
        usize::from(self.sink.is_some())
    }

    /// Run stages, render and write. Failures are reported and swallowed.
    pub fn process(&self, mut event: Event) {
        let (Some(renderer), Some(sink)) = (&self.renderer, &self.sink) else {
            return;
        };
        if event.level < self.min_level {
            return;
        }

        for processor in &self.processors {
            processor.process(&mut event);
        }

        let line = match renderer.render(&event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(logger = %event.logger, error = %e, "Dropping log event");
                return;
            }
        };

        if let Err(e) = sink.write_line(&line) {
            tracing::warn!(
                logger = %event.logger,
                sink = %sink.description(),
                error = %e,
                "Failed to write log event"
            );
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("min_level", &self.min_level)
            .field("spec", &self.spec)
            .field("processors", &self.processors.len())
            .field("sink", &self.sink)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    #[test]
    fn test_classify() {
        assert_eq!(
            EnvironmentMode::classify(None, DEVELOPMENT_SENTINEL),
            EnvironmentMode::Development
        );
        assert_eq!(
            EnvironmentMode::classify(Some("development"), DEVELOPMENT_SENTINEL),
            EnvironmentMode::Development
        );
        assert_eq!(
            EnvironmentMode::classify(Some("production"), DEVELOPMENT_SENTINEL),
            EnvironmentMode::NonDevelopment
        );
        assert_eq!(
            EnvironmentMode::classify(Some("Development"), DEVELOPMENT_SENTINEL),
            EnvironmentMode::NonDevelopment
        );
        assert_eq!(
            EnvironmentMode::classify(Some("dev"), "dev"),
            EnvironmentMode::Development
        );
    }

    #[test]
    fn test_development_spec() {
        let spec = PipelineSpec::for_mode(EnvironmentMode::Development);
        assert_eq!(spec.format, RenderFormat::Console);
        assert_eq!(spec.target, SinkTarget::Stdout);
        assert_eq!(spec.delivery, Delivery::Synchronous);
        assert!(spec.stages.contains(&Stage::ExcInfo));
        assert_eq!(spec.stages.first(), Some(&Stage::MergeContextVars));
    }

    #[test]
    fn test_non_development_spec() {
        let spec = PipelineSpec::for_mode(EnvironmentMode::NonDevelopment);
        assert_eq!(spec.format, RenderFormat::Json);
        assert_eq!(spec.target, SinkTarget::Stderr);
        assert_eq!(spec.delivery, Delivery::NonBlocking);
        assert!(!spec.stages.contains(&Stage::ExcInfo));
    }

    #[test]
    fn test_timestamp_before_render_stages_ordered() {
        for mode in [EnvironmentMode::Development, EnvironmentMode::NonDevelopment] {
            let stages = PipelineSpec::for_mode(mode).stages;
            let ts = stages.iter().position(|s| *s == Stage::TimeStamper).unwrap();
            let level = stages.iter().position(|s| *s == Stage::AddLogLevel).unwrap();
            assert!(level < ts);
        }
    }

    #[test]
    fn test_process_filters_and_writes() {
        let lines = Arc::new(Mutex::new(Vec::<u8>::new()));
        let handle = lines.clone();
        let sink = Sink::from_make_writer(move || Capture(handle.clone()));
        let pipeline = Pipeline::new(
            PipelineSpec::for_mode(EnvironmentMode::NonDevelopment),
            Level::Warning,
            Vec::new(),
            sink,
        );

        assert!(!pipeline.enabled(Level::Info));
        pipeline.process(Event::new("t".into(), Level::Info, "dropped"));
        pipeline.process(Event::new("t".into(), Level::Error, "kept"));

        let out = String::from_utf8(lines.lock().unwrap().clone()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("\"text\":\"kept\""));
    }

    #[test]
    fn test_detached_drops_everything() {
        let pipeline = Pipeline::detached();
        assert_eq!(pipeline.transport_count(), 0);
        assert!(!pipeline.enabled(Level::Critical));
    }

    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
