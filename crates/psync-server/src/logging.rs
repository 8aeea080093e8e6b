//! Tracing setup shared by every entry point.
//!
//! Everything the filter lets through goes to a daily-rotated log file;
//! warnings and errors are echoed to stderr as well.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

pub const LOG_FILE_NAME: &str = "psync.log";

/// Build the `EnvFilter`, preferring `RUST_LOG` over `default_filter`.
///
/// An unparseable directive string falls back to `info`.
#[must_use]
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Sets up:
/// - File layer: writes `psync.log` under `log_dir` with daily rotation
/// - Stderr layer: WARN and above, compact
/// - `EnvFilter`: respects `RUST_LOG`, defaults to `filter`
///
/// Returns a `WorkerGuard` that must be kept alive for the file logging to
/// work. A second call in the same process leaves the first subscriber in
/// place.
pub fn init_tracing(log_dir: &Path, filter: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter(filter));

    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    if Registry::default()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Tracing subscriber already installed");
    }

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init_tracing(dir.path(), "debug");
        tracing::warn!("written to the log file");
        drop(guard);

        let written = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|entry| entry.file_name().to_string_lossy().starts_with(LOG_FILE_NAME));
        assert!(written);
    }
}
