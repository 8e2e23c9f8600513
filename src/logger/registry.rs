//! Process-wide logger registry.
//!
//! # Responsibilities
//! - Map logger names to their active pipeline
//! - Replace (never append) a pipeline when a name is configured again
//! - Detach transports on removal and shutdown
//!
//! # Lifecycle
//! Create one registry at startup (or use [`LoggerRegistry::global`]) and
//! pass it to the code that configures loggers. Handles keep working after
//! their name is reconfigured; after `remove`/`shutdown` they drop events.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::validation::validate_config;
use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::event::Fields;
use crate::logger::facade::{LoggerBuilder, PreparedLogger};
use crate::logger::handle::{Logger, Slot};
use crate::pipeline::Pipeline;

/// A configured name: its pipeline slot and the fields bound by the facade.
#[derive(Debug, Clone)]
struct Registered {
    slot: Slot,
    bound: Fields,
}

/// Registry of named pipelines.
#[derive(Debug, Default)]
pub struct LoggerRegistry {
    slots: DashMap<String, Registered>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static LoggerRegistry {
        static GLOBAL: OnceLock<LoggerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(LoggerRegistry::new)
    }

    /// Configure one logger. On error the registry is left unchanged.
    pub fn configure(&self, builder: LoggerBuilder) -> Result<Logger> {
        let prepared = builder.prepare()?;
        Ok(self.install(prepared))
    }

    /// Configure every logger of a configuration file. All loggers are
    /// validated and built before any of them is installed.
    pub fn configure_all(&self, config: &LoggingConfig) -> Result<Vec<Logger>> {
        validate_config(config).map_err(|errors| {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            Error::InvalidConfiguration(joined)
        })?;

        let prepared = config
            .loggers
            .iter()
            .map(|logger| LoggerBuilder::from_config(logger, &config.environment).prepare())
            .collect::<Result<Vec<_>>>()?;

        Ok(prepared.into_iter().map(|p| self.install(p)).collect())
    }

    fn install(&self, prepared: PreparedLogger) -> Logger {
        let PreparedLogger {
            name,
            mode,
            pipeline,
            bound,
        } = prepared;
        let level = pipeline.min_level();

        let (slot, previous) = match self.slots.entry(name.clone()) {
            Entry::Occupied(mut entry) => {
                let registered = entry.get_mut();
                registered.bound = bound.clone();
                let previous = registered.slot.swap(Arc::new(pipeline));
                (registered.slot.clone(), Some(previous))
            }
            Entry::Vacant(entry) => {
                let slot: Slot = Arc::new(ArcSwap::from_pointee(pipeline));
                entry.insert(Registered {
                    slot: slot.clone(),
                    bound: bound.clone(),
                });
                (slot, None)
            }
        };

        // Outside the shard lock: a queued sink flushes when dropped.
        if let Some(previous) = previous {
            tracing::debug!(
                logger = %name,
                detached = previous.transport_count(),
                "Replaced logger pipeline"
            );
            drop(previous);
        }

        tracing::debug!(logger = %name, mode = ?mode, level = %level, "Logger configured");
        Logger::new(name.into(), slot, bound)
    }

    /// A handle for an already configured name, carrying the fields bound
    /// when it was last configured.
    pub fn get(&self, name: &str) -> Option<Logger> {
        let registered = self.slots.get(name)?.clone();
        Some(Logger::new(name.into(), registered.slot, registered.bound))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Configured names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Transports attached under `name` (0 or 1).
    pub fn transport_count(&self, name: &str) -> usize {
        self.slots
            .get(name)
            .map(|registered| registered.slot.load().transport_count())
            .unwrap_or(0)
    }

    /// Detach and forget `name`. Existing handles drop their events from now on.
    pub fn remove(&self, name: &str) -> bool {
        match self.slots.remove(name) {
            Some((_, registered)) => {
                registered.slot.store(Arc::new(Pipeline::detached()));
                tracing::debug!(logger = %name, "Logger removed");
                true
            }
            None => false,
        }
    }

    /// Detach every logger. Queued non-blocking output is flushed once the
    /// last in-flight emission releases its pipeline.
    pub fn shutdown(&self) {
        for name in self.names() {
            self.remove(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Value;
    use crate::pipeline::EnvironmentMode;
    use std::io::{self, Write};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn lines(&self) -> usize {
            self.0.lock().unwrap().iter().filter(|b| **b == b'\n').count()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_get_returns_bound_channel() {
        let registry = LoggerRegistry::new();
        LoggerBuilder::new("svc")
            .channel("access")
            .mode(EnvironmentMode::NonDevelopment)
            .writer(io::sink)
            .configure(&registry)
            .unwrap();

        let logger = registry.get("svc").unwrap();
        assert_eq!(logger.bound().get("channel"), Some(&Value::from("access")));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_replacing_queued_pipeline_flushes_and_keeps_lookup() {
        let registry = LoggerRegistry::new();
        let first = Buffer::default();
        let logger = LoggerBuilder::new("svc")
            .mode(EnvironmentMode::NonDevelopment)
            .queued_writer(first.clone())
            .configure(&registry)
            .unwrap();
        for _ in 0..50 {
            logger.info("queued");
        }

        LoggerBuilder::new("svc")
            .mode(EnvironmentMode::NonDevelopment)
            .writer(io::sink)
            .configure(&registry)
            .unwrap();

        assert_eq!(first.lines(), 50);
        assert!(registry.contains("svc"));
        assert!(registry.get("svc").unwrap().bound().is_empty());
    }
}
