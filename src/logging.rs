//! Tracing configuration and log routing.
//!
//! Console logs go to stderr through a compact formatter so that stdout stays reserved for the
//! pipeline result. A second, non-blocking layer appends to a log file unless file logging is
//! disabled.
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "filing-analyst.log";

/// Logging switches resolved from the command line.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Lower the default filter from `info` to `debug`.
    pub verbose: bool,
    /// Explicit log file; `None` selects `logs/filing-analyst.log`.
    pub file: Option<PathBuf>,
    /// Skip the file layer entirely.
    pub console_only: bool,
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `verbose` when set. The returned guard flushes the file layer when
/// dropped and must be held until the program is done logging.
#[must_use = "dropping the guard stops file logging"]
pub fn init_tracing(options: &LogOptions) -> Option<WorkerGuard> {
    let default_level = if options.verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    let writer = if options.console_only {
        None
    } else {
        configure_file_writer(options.file.as_deref())
    };

    if let Some((writer, guard)) = writer {
        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact();

        registry.with(file_layer).init();
        Some(guard)
    } else {
        registry.init();
        None
    }
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when the log directory cannot be created or the target file cannot be opened.
fn configure_file_writer(path: Option<&Path>) -> Option<(NonBlocking, WorkerGuard)> {
    let file = match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty())
                && let Err(err) = std::fs::create_dir_all(parent)
            {
                eprintln!("Failed to create log directory {}: {err}", parent.display());
                return None;
            }
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
                .ok()?
        }
        None => {
            if let Err(err) = std::fs::create_dir_all(DEFAULT_LOG_DIR) {
                eprintln!("Failed to create logs directory: {err}");
                return None;
            }
            return Some(tracing_appender::non_blocking(
                tracing_appender::rolling::never(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE),
            ));
        }
    };

    Some(tracing_appender::non_blocking(file))
}
