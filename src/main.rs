//! envlog demo server.
//!
//! Configures the loggers named in the config file (or one default logger),
//! then serves `POST /api/v1/test`, which logs a message under the request's
//! `request_id`.
//!
//! ```text
//!   envlog-demo --config envlog.toml --watch
//!
//!   config file ──▶ LoggerRegistry ◀── watcher (optional)
//!                        │
//!   request ──▶ x-request-id ──▶ ambient context ──▶ handler ──▶ Logger ──▶ sink
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use envlog::config::loader::load_config;
use envlog::config::watcher::{apply_updates, ConfigWatcher};
use envlog::config::LoggingConfig;
use envlog::http::{shutdown_signal, DemoServer};
use envlog::{configure_logger, LoggerLayer, LoggerRegistry};

#[derive(Parser)]
#[command(name = "envlog-demo")]
#[command(about = "Serve the envlog request-context demo", long_about = None)]
struct Cli {
    /// Address to listen on; overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// TOML file describing the loggers.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LoggingConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    let registry = Arc::new(LoggerRegistry::new());
    registry.configure_all(&config)?;
    let logger = match registry.get(&config.server.logger) {
        Some(logger) => logger,
        None => configure_logger(&registry, &config.server.logger, None, None)?,
    };

    // Internal diagnostics go to fmt; tower_http request events also go
    // through the demo logger.
    let http_events = LoggerLayer::new(logger.clone())
        .with_filter(filter::filter_fn(|meta| meta.target().starts_with("tower_http")));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "envlog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(http_events)
        .init();

    tracing::info!(
        loggers = ?registry.names(),
        bind_address = %config.server.bind_address,
        "Loggers configured"
    );

    let _watcher = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tokio::spawn(apply_updates(registry.clone(), updates));
            Some(handle)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = DemoServer::new(config.server.clone(), logger);
    server.run(listener, shutdown_signal()).await?;

    registry.shutdown();
    tracing::info!("Shutdown complete");
    Ok(())
}
