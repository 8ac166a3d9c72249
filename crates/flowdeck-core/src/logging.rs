//! Logging infrastructure for flowdeck.
//!
//! Structured logging through the `tracing` ecosystem. Everything goes to a
//! JSON lines file. The dashboard owns the terminal while it runs, so the
//! stderr console layer is only installed when asked for.
//!
//! ## Features
//!
//! - JSON lines format for machine parsing
//! - File output to `~/.flowdeck/logs/flowdeck.log` (daily rotation)
//! - Optional console output with configurable verbosity
//! - `-v` flag support for verbose logging
//!
//! ## Example
//!
//! ```no_run
//! use flowdeck_core::logging::{self, LogOutput};
//!
//! let _guard = logging::init_logging(None, false, LogOutput::FileOnly).expect("logging init");
//!
//! tracing::info!("flowdeck started");
//! tracing::debug!(feed = "dashboard", "fetching");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::error::{FlowdeckError, Result};

/// Log file name inside the log directory.
pub const LOG_FILE_NAME: &str = "flowdeck.log";

/// Where log events are written besides the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log file only. Use this while the TUI owns the terminal.
    FileOnly,
    /// Log file plus human-readable stderr.
    FileAndConsole,
}

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the flowdeck logging system.
///
/// This sets up:
/// - File logging to `~/.flowdeck/logs/flowdeck.log` (JSON lines format)
/// - Console logging to stderr (human-readable format) for
///   [`LogOutput::FileAndConsole`]
///
/// `RUST_LOG` overrides the level chosen from `verbose`.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, output: LogOutput) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| FlowdeckError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowdeck={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer(output, verbose))
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, ?output, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

fn console_layer<S>(output: LogOutput, verbose: bool) -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if output == LogOutput::FileOnly {
        return None;
    }

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();
    Some(layer.boxed())
}

/// Initialize minimal console-only logging for tests.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Base directory for flowdeck files: `~/.flowdeck/`.
pub fn flowdeck_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| FlowdeckError::Internal {
        message: "home directory could not be determined".into(),
    })?;

    Ok(home.join(".flowdeck"))
}

/// Get the default log directory path: `~/.flowdeck/logs/`.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(flowdeck_home()?.join("logs"))
}

/// Get the default log file path: `~/.flowdeck/logs/flowdeck.log`.
pub fn default_log_file() -> Result<PathBuf> {
    Ok(default_log_dir()?.join(LOG_FILE_NAME))
}

/// Log a feed fetch outcome under the `flowdeck::feed` target.
///
/// ```ignore
/// log_feed_event!("dashboard", "fetched", executions = 42);
/// ```
#[macro_export]
macro_rules! log_feed_event {
    ($feed:expr, $event:expr) => {
        tracing::info!(
            target: "flowdeck::feed",
            feed = $feed,
            event = $event,
            "feed event"
        )
    };
    ($feed:expr, $event:expr, $($field:tt)*) => {
        tracing::info!(
            target: "flowdeck::feed",
            feed = $feed,
            event = $event,
            $($field)*,
            "feed event"
        )
    };
}

/// Log an error notification under the `flowdeck::notify` target.
///
/// ```ignore
/// log_notification!(count = 2, kind = "batch");
/// ```
#[macro_export]
macro_rules! log_notification {
    ($($field:tt)*) => {
        tracing::info!(
            target: "flowdeck::notify",
            $($field)*,
            "error notification"
        )
    };
}
