//! Run-scoped logging: console output plus a dated log file.

use std::io;
use std::path::Path;

use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::error::{PrepError, Result};

/// Keeps the subscriber (and the file writer behind it) alive. Dropping
/// the guard detaches logging and flushes the log file, so each pipeline
/// run gets its own file session.
pub struct LogGuard {
    _appender: WorkerGuard,
    _default: DefaultGuard,
}

/// Install a thread-local subscriber writing to stderr and to a daily
/// dated file under `log_dir` (created if absent). Console verbosity
/// follows `RUST_LOG` when set, defaulting to `info`; the file always
/// records `info` and above.
pub fn init_logging(log_dir: &Path) -> Result<LogGuard> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| PrepError::Telemetry(format!("create log dir {}: {e}", log_dir.display())))?;

    let appender = tracing_appender::rolling::daily(log_dir, "proxprep.log");
    let (file_writer, appender_guard) = tracing_appender::non_blocking(appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("info")),
        );

    Ok(LogGuard {
        _appender: appender_guard,
        _default: tracing::subscriber::set_default(subscriber),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_log_dir_and_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        {
            let _guard = init_logging(&log_dir).unwrap();
            tracing::info!("session line");
        }
        let entries: Vec<_> = std::fs::read_dir(&log_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("proxprep.log."));
    }

    #[test]
    fn test_guard_scopes_the_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let guard = init_logging(dir.path()).unwrap();
        drop(guard);
        // After drop, logging must not panic or write to the old file.
        tracing::info!("after guard");
    }
}
