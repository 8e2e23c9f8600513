//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use envlog::{EnvironmentMode, Level, Logger, LoggerBuilder, LoggerRegistry};

/// An in-memory writer whose clones share one buffer.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Every line parsed as JSON.
    #[allow(dead_code)]
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Configure `name` in `mode` at `level`, writing into a fresh capture.
#[allow(dead_code)]
pub fn capture_logger(
    registry: &LoggerRegistry,
    name: &str,
    level: Level,
    mode: EnvironmentMode,
) -> (Logger, Capture) {
    let capture = Capture::default();
    let writer = capture.clone();
    let logger = LoggerBuilder::new(name)
        .level(level.as_str())
        .mode(mode)
        .writer(move || writer.clone())
        .configure(registry)
        .unwrap();
    (logger, capture)
}

/// An environment variable name no other test uses.
#[allow(dead_code)]
pub fn unique_env_var() -> String {
    format!("ENVLOG_TEST_{}", uuid::Uuid::new_v4().simple())
}

/// A fresh directory under the system temp dir.
#[allow(dead_code)]
pub fn temp_dir(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()))
}
