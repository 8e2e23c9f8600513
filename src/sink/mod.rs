//! Output destinations.
//!
//! # Responsibilities
//! - Open stdout, stderr or an append-only file
//! - Optionally move the actual I/O to a background worker
//! - Accept any `MakeWriter` for embedding and tests
//!
//! # Design Decisions
//! - Writer plumbing is `tracing-subscriber`'s `MakeWriter`; non-blocking
//!   delivery and files come from `tracing-appender`
//! - A sink owns its worker guard, so dropping the pipeline flushes the queue
//! - Each line is written with a single `write_all`

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

use crate::error::{Error, Result};

/// Where rendered lines go.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkTarget {
    Stdout,
    Stderr,
    File { path: PathBuf },
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Stdout => f.write_str("stdout"),
            SinkTarget::Stderr => f.write_str("stderr"),
            SinkTarget::File { path } => write!(f, "file {}", path.display()),
        }
    }
}

/// Whether the emitting thread performs the write itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Synchronous,
    NonBlocking,
}

/// An opened destination.
pub struct Sink {
    writer: BoxMakeWriter,
    description: String,
    delivery: Delivery,
    _guard: Option<WorkerGuard>,
}

impl Sink {
    /// Open `target` with the requested delivery.
    pub fn open(target: &SinkTarget, delivery: Delivery) -> Result<Self> {
        let description = target.to_string();
        let sink = match (target, delivery) {
            (SinkTarget::Stdout, Delivery::Synchronous) => {
                Self::synchronous(BoxMakeWriter::new(io::stdout), description)
            }
            (SinkTarget::Stdout, Delivery::NonBlocking) => Self::queued(io::stdout(), description),
            (SinkTarget::Stderr, Delivery::Synchronous) => {
                Self::synchronous(BoxMakeWriter::new(io::stderr), description)
            }
            (SinkTarget::Stderr, Delivery::NonBlocking) => Self::queued(io::stderr(), description),
            (SinkTarget::File { path }, delivery) => {
                let appender = open_file(path).map_err(|source| Error::Sink {
                    target: description.clone(),
                    source,
                })?;
                match delivery {
                    Delivery::Synchronous => {
                        Self::synchronous(BoxMakeWriter::new(appender), description)
                    }
                    Delivery::NonBlocking => Self::queued(appender, description),
                }
            }
        };
        Ok(sink)
    }

    /// Wrap an arbitrary writer factory; writes happen on the emitting thread.
    pub fn from_make_writer<M>(make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self::synchronous(BoxMakeWriter::new(make_writer), "custom writer".to_string())
    }

    /// Queue lines for a background worker that writes to `writer`.
    pub fn non_blocking<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::queued(writer, "custom writer".to_string())
    }

    fn synchronous(writer: BoxMakeWriter, description: String) -> Self {
        Self {
            writer,
            description,
            delivery: Delivery::Synchronous,
            _guard: None,
        }
    }

    fn queued<W>(writer: W, description: String) -> Self
    where
        W: Write + Send + 'static,
    {
        let (queue, guard): (NonBlocking, WorkerGuard) = tracing_appender::non_blocking(writer);
        Self {
            writer: BoxMakeWriter::new(queue),
            description,
            delivery: Delivery::NonBlocking,
            _guard: Some(guard),
        }
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Write one line followed by a newline.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut writer = self.writer.make_writer();
        writer.write_all(&buf)?;
        writer.flush()
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("target", &self.description)
            .field("delivery", &self.delivery)
            .finish()
    }
}

fn open_file(path: &Path) -> std::result::Result<RollingFileAppender, Box<dyn std::error::Error + Send + Sync>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("{} has no file name", path.display()))?
        .to_string_lossy()
        .into_owned();
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)?;
    Ok(appender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

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
    fn test_custom_writer_appends_newline() {
        let buffer = Buffer::default();
        let handle = buffer.clone();
        let sink = Sink::from_make_writer(move || handle.clone());

        sink.write_line("first").unwrap();
        sink.write_line("second").unwrap();
        assert_eq!(&*buffer.0.lock().unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn test_non_blocking_flushes_on_drop() {
        let buffer = Buffer::default();
        let sink = Sink::non_blocking(buffer.clone());
        assert_eq!(sink.delivery(), Delivery::NonBlocking);

        sink.write_line("queued").unwrap();
        drop(sink);
        assert_eq!(&*buffer.0.lock().unwrap(), b"queued\n");
    }

    #[test]
    fn test_file_sink() {
        let dir = std::env::temp_dir().join(format!("envlog-sink-{}", uuid::Uuid::new_v4()));
        let path = dir.join("app.log");
        let sink = Sink::open(&SinkTarget::File { path: path.clone() }, Delivery::Synchronous).unwrap();
        sink.write_line("info message").unwrap();
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "info message\n");
        std::fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn test_target_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            target: SinkTarget,
        }
        let w: Wrapper = toml::from_str(r#"target = { kind = "file", path = "logs/a.log" }"#).unwrap();
        assert_eq!(w.target, SinkTarget::File { path: "logs/a.log".into() });
    }
}
