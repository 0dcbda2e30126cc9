//! Logging bootstrap for nxfs binaries and tooling.
//!
//! The library crates only emit `tracing` events; installing a subscriber
//! is the binary's job, through [`init_logging`]. Output goes to stderr,
//! to a daily-rolled file, or to both, depending on the config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error). Overridden by
    /// `RUST_LOG` when set.
    pub level: String,

    /// Suppress the stderr output.
    pub quiet: bool,

    /// Directory for daily-rolled log files. If None, no file logging.
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".into(),
            quiet: false,
            log_dir: None,
            file_prefix: "nxfs".into(),
        }
    }
}

/// Initialize the logging system. Should be called once at program
/// startup. Returns a guard that must be held alive for the duration of
/// the program when file logging is enabled (it flushes the non-blocking
/// writer).
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_dir {
        Some(ref log_dir) => {
            let appender = rolling::daily(log_dir, format!("{}.log", config.file_prefix));
            let (file_writer, guard) = tracing_appender::non_blocking(appender);

            if config.quiet {
                builder.with_ansi(false).with_writer(file_writer).init();
            } else {
                builder
                    .with_ansi(false)
                    .with_writer(file_writer.and(std::io::stderr))
                    .init();
            }
            Some(guard)
        }
        None => {
            if !config.quiet {
                builder.with_writer(std::io::stderr).init();
            }
            None
        }
    }
}
