//! Logging initialization and configuration.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the embedding program. The `remote-shell` binary uses [`init_logging`].
//!
//! Logs go to stderr so they never mix with command output on stdout. When
//! `REMOTE_SHELL_LOG_DIR` is set, they are written to a per-run file in that
//! directory instead.
//!
//! # Configuration
//!
//! The log level can be controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=trace` - Include every read-loop transition
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs (default)
//! - `RUST_LOG=warn` - Show warnings and errors only

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const ENV_LOG_DIR: &str = "REMOTE_SHELL_LOG_DIR";

/// Initialize the logging system.
///
/// Returns the guard of the non-blocking file writer when file logging is
/// active; keep it alive until exit so buffered lines are flushed.
pub fn init_logging() -> Option<WorkerGuard> {
    // Default to "info" level if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = std::env::var_os(ENV_LOG_DIR).map(PathBuf::from);
    let log_file = log_dir.as_deref().and_then(|dir| match create_log_file(dir) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Warning: {:#}; logging to stderr", e);
            None
        }
    });

    match log_file {
        Some((file, path)) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI colors in log files
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .init();

            tracing::info!("Logging initialized - writing to {}", path.display());
            Some(guard)
        }
        None => {
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

/// Create a uniquely named log file for this run, e.g.
/// `remote-shell.2024-12-06-14-30-25.log`.
fn create_log_file(dir: &Path) -> anyhow::Result<(fs::File, PathBuf)> {
    use anyhow::Context as _;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory {}", dir.display()))?;

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let path = dir.join(format!("remote-shell.{}.log", timestamp));
    let file = fs::File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    Ok((file, path))
}
