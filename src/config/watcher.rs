//! Hot reload of the logging configuration file.
//!
//! File events are collapsed: editors often emit several modify events per
//! save, and each reload rebuilds every logger.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::LoggingConfig;
use crate::logger::LoggerRegistry;

/// Quiet period after a file event before the file is read.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches one configuration file and publishes every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<LoggingConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiver of validated configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<LoggingConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            debounce: RELOAD_DEBOUNCE,
            update_tx,
        };
        (watcher, update_rx)
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called inside a Tokio runtime; reloads stop
    /// when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let runtime = Handle::try_current().map_err(|e| notify::Error::generic(&e.to_string()))?;
        let (change_tx, change_rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if change_tx.send(()).is_err() {
                        tracing::debug!("Config reload task has stopped, change ignored");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Logging config watcher started");
        runtime.spawn(reload_on_change(
            self.path,
            self.debounce,
            change_rx,
            self.update_tx,
        ));
        Ok(watcher)
    }
}

async fn reload_on_change(
    path: PathBuf,
    debounce: Duration,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<LoggingConfig>,
) {
    while changes.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        let mut coalesced = 1;
        while changes.try_recv().is_ok() {
            coalesced += 1;
        }

        match load_config(&path) {
            Ok(config) => {
                tracing::info!(path = ?path, events = coalesced, "Logging config reloaded");
                if updates.send(config).is_err() {
                    tracing::warn!(path = ?path, "Nobody applies config reloads anymore, stopping");
                    return;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected logging config reload, keeping current loggers");
            }
        }
    }
}

/// Reconfigure `registry` with every configuration received, until the
/// sending side is dropped. A rejected configuration leaves all loggers as
/// they were.
pub async fn apply_updates(
    registry: Arc<LoggerRegistry>,
    mut updates: mpsc::UnboundedReceiver<LoggingConfig>,
) {
    while let Some(config) = updates.recv().await {
        match registry.configure_all(&config) {
            Ok(loggers) => {
                tracing::info!(count = loggers.len(), "Loggers reconfigured");
            }
            Err(e) => {
                tracing::error!(error = %e, "Rejected logging config reload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LoggerConfig;
    use crate::sink::SinkTarget;

    #[tokio::test]
    async fn test_apply_updates_reconfigures() {
        let registry = Arc::new(LoggerRegistry::new());
        let (tx, rx) = mpsc::unbounded_channel();

        let mut config = LoggingConfig::default();
        config.loggers.push(LoggerConfig {
            name: "reloaded".into(),
            target: Some(SinkTarget::Stderr),
            non_blocking: Some(false),
            ..LoggerConfig::default()
        });
        tx.send(config).unwrap();

        let mut bad = LoggingConfig::default();
        bad.loggers.push(LoggerConfig {
            name: "other".into(),
            level: "nope".into(),
            ..LoggerConfig::default()
        });
        tx.send(bad).unwrap();
        drop(tx);

        apply_updates(registry.clone(), rx).await;
        assert_eq!(registry.names(), vec!["reloaded".to_string()]);
    }

    #[tokio::test]
    async fn test_file_change_is_published_once() {
        let dir = std::env::temp_dir().join(format!("envlog-watch-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("envlog.toml");
        std::fs::write(&path, "[[loggers]]\nname = \"first\"\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.with_debounce(Duration::from_millis(300)).run().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        std::fs::write(&path, "[[loggers]]\nname = \"draft\"\n").unwrap();
        std::fs::write(&path, "[[loggers]]\nname = \"second\"\n").unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(config.loggers[0].name, "second");

        let extra = tokio::time::timeout(Duration::from_millis(800), updates.recv()).await;
        assert!(extra.is_err());

        std::fs::remove_dir_all(dir).unwrap_or_default();
    }
}
