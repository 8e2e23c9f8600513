use std::path::PathBuf;

use clap::{Parser, Subcommand};

use envlog::context::{bind_contextvars, bound_contextvars, clear_contextvars};
use envlog::{
    configure_logger, CaptureMode, EnvironmentMode, Level, Logger, LoggerBuilder,
    LoggerRegistry, RenderFormat, SinkTarget,
};

#[derive(Parser)]
#[command(name = "envlog-samples")]
#[command(about = "Walk through the envlog logger features", long_about = None)]
struct Cli {
    /// Logger name used by every sample.
    #[arg(short, long, default_value = "samples")]
    name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One event per level, DEBUG and up
    Levels,
    /// Machine-readable JSON lines on stdout
    Json,
    /// Bound fields on derived handles
    Bind,
    /// Arguments computed only when the event is written
    Lazy,
    /// Failures recorded with their error chain
    Catch,
    /// Ambient context shared by every logger
    Context,
    /// Append to a file
    File {
        #[arg(short, long, default_value = "logs/samples.log")]
        path: PathBuf,
    },
    /// Flat JSON records
    Flat,
}

#[derive(Debug, thiserror::Error)]
#[error("division by zero")]
struct ZeroDivisionError;

fn divide(a: i64, b: i64) -> Result<i64, ZeroDivisionError> {
    if b == 0 {
        return Err(ZeroDivisionError);
    }
    Ok(a / b)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = LoggerRegistry::new();

    match cli.command {
        Commands::Levels => {
            let logger = configure_logger(&registry, &cli.name, Some("DEBUG"), None)?;
            levels(&logger);
        }
        Commands::Json => {
            let logger = LoggerBuilder::new(&cli.name)
                .mode(EnvironmentMode::NonDevelopment)
                .target(SinkTarget::Stdout)
                .non_blocking(false)
                .configure(&registry)?;
            envlog::info!(logger, "user {user} logged in", user = "alice", attempts = 3);
            envlog::warning!(logger, "disk almost full", free_mb = 120);
        }
        Commands::Bind => {
            let logger = configure_logger(&registry, &cli.name, None, Some("samples"))?;
            let request = logger.bind([("request_id", "abc123"), ("user", "alice")]);
            request.info("bound fields on this one");
            logger.info("but not on the parent");
        }
        Commands::Lazy => {
            let logger = configure_logger(&registry, &cli.name, Some("INFO"), None)?;
            logger
                .at(Level::Debug, "never rendered")
                .lazy("expensive", || -> i64 { (1..=1_000_000).sum() })
                .emit();
            logger
                .at(Level::Info, "computed once: {expensive}")
                .lazy("expensive", || -> i64 { (1..=1_000).sum() })
                .emit();
            logger
                .at(Level::Info, "this one fails to compute")
                .try_lazy("broken", || divide(1, 0))
                .emit();
        }
        Commands::Catch => {
            let logger = configure_logger(&registry, &cli.name, None, None)?;
            if logger.catch(|| divide(1, 0)).is_err() {
                logger.info("the error was propagated");
            }
            let suppressed = logger.catch_suppress(|| divide(1, 0));
            logger.at(Level::Info, "suppressed").field("result", suppressed).emit();
            let value = logger.catch_unwind(CaptureMode::Suppress, || -> i64 {
                panic!("unreachable branch")
            });
            logger.at(Level::Info, "panic suppressed").field("result", value).emit();
        }
        Commands::Context => {
            let logger = configure_logger(&registry, &cli.name, None, None)?;
            clear_contextvars();
            bind_contextvars([("request_id", "req-42")]);
            logger.info("ambient request id");
            {
                let _guard = bound_contextvars([("user", "alice")]);
                logger.info("ambient user as well");
            }
            logger.info("user is gone again");
            clear_contextvars();
        }
        Commands::File { path } => {
            let logger = LoggerBuilder::new(&cli.name)
                .target(SinkTarget::File { path: path.clone() })
                .colors(false)
                .configure(&registry)?;
            levels(&logger);
            println!("wrote {}", path.display());
        }
        Commands::Flat => {
            let logger = LoggerBuilder::new(&cli.name)
                .format(RenderFormat::Flat)
                .target(SinkTarget::Stdout)
                .non_blocking(false)
                .channel("access")
                .configure(&registry)?;
            logger.warning("flat record");
        }
    }

    registry.shutdown();
    Ok(())
}

fn levels(logger: &Logger) {
    envlog::debug!(logger, "debug message");
    envlog::info!(logger, "info message");
    envlog::warning!(logger, "warning message");
    envlog::error!(logger, "error message");
    envlog::critical!(logger, "critical message");
}
