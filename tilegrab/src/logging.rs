//! Logging setup.
//!
//! Library code logs through `tracing` macros. Binaries call
//! [`init_logging`] or [`init_logging_with`] once:
//! - Writes to `{log_dir}/{log_file}` (cleared on start)
//! - Also prints to stdout
//! - Configurable via the `RUST_LOG` environment variable (default `info`)

use std::fs;
use std::io;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Keeps the file writer alive. Dropping it flushes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initializes logging with every enabled level on the console.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    init_logging_with(log_dir, log_file, LevelFilter::TRACE)
}

/// Initializes logging, capping console output at `console_level`.
///
/// The file always receives everything `RUST_LOG` allows.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the log file
/// cannot be cleared, or a global subscriber is already installed.
pub fn init_logging_with(
    log_dir: &Path,
    log_file: &str,
    console_level: LevelFilter,
) -> Result<LoggingGuard, io::Error> {
    let (subscriber, guard) = build_subscriber(log_dir, log_file, console_level)?;
    subscriber.try_init().map_err(io::Error::other)?;
    Ok(guard)
}

/// Builds the file and console subscriber without installing it.
pub fn build_subscriber(
    log_dir: &Path,
    log_file: &str,
    console_level: LevelFilter,
) -> Result<(impl Subscriber + Send + Sync + 'static, LoggingGuard), io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_level);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer);

    Ok((
        subscriber,
        LoggingGuard {
            _file_guard: file_guard,
        },
    ))
}

/// Default log directory, `~/.tilegrab/logs`, or `logs` without a home.
pub fn default_log_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".tilegrab").join("logs"))
        .unwrap_or_else(|| "logs".into())
}

pub fn default_log_file() -> &'static str {
    "tilegrab.log"
}
