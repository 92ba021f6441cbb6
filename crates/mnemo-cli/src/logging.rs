//! Tracing setup: stderr filtered by `RUST_LOG`, plus log files.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

pub const ERROR_LOG_FILE: &str = "error.log";
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// Create a non-blocking writer appending to `<log_dir>/<file_name>`.
///
/// The returned guard must be kept alive for the duration of logging.
pub fn create_log_writer(
    log_dir: &Path,
    file_name: &str,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log dir: {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}

/// Install the global subscriber. `error.log` is always written;
/// `debug.log` only when `debug` is set.
///
/// Returns the worker guards; drop them only at process exit.
pub fn init(log_dir: &Path, debug: bool) -> Result<Vec<WorkerGuard>> {
    let mut guards = Vec::new();

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_filter(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .from_env_lossy(),
    );

    let (error_writer, guard) = create_log_writer(log_dir, ERROR_LOG_FILE)?;
    guards.push(guard);
    let error_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(error_writer)
        .with_filter(LevelFilter::ERROR);

    let debug_layer = if debug {
        let (debug_writer, guard) = create_log_writer(log_dir, DEBUG_LOG_FILE)?;
        guards.push(guard);
        Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(debug_writer)
                .with_filter(LevelFilter::DEBUG),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(error_layer)
        .with(debug_layer)
        .try_init()
        .ok();

    Ok(guards)
}
