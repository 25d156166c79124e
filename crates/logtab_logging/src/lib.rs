//! Shared logging utilities for logtab binaries.
//!
//! Nothing here installs a process-wide subscriber. [`init_logging`] builds a
//! [`LogContext`] at process entry, and callers run their work inside
//! [`LogContext::in_scope`] so every `tracing` event emitted by the library
//! crates reaches the configured sinks.

use anyhow::{Context, Result};
use rolling::{Limits, RollingLog};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Layer};

mod rolling;

const LOGTAB_TARGETS: [&str; 4] = ["logtab", "logtab_fsm", "logtab_sinks", "logtab_logging"];
const LOG_LIMITS: Limits = Limits {
    keep: 5,
    max_bytes: 10 * 1024 * 1024,
};

/// Logging configuration shared by logtab binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// 0 prints info to stderr, anything higher prints debug.
    pub verbosity: u8,
    /// Overrides the default `~/.logtab/logs` directory.
    pub log_dir: Option<PathBuf>,
}

/// Explicit logging context handed from process entry to the code that logs.
#[derive(Clone)]
pub struct LogContext {
    dispatch: Dispatch,
    log_file: PathBuf,
}

impl LogContext {
    /// Run `f` with this context as the active subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Path of the active (not yet rotated) log file.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// Build a context with a rolling file writer and bare-message stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<LogContext> {
    let log_dir = config.log_dir.unwrap_or_else(logs_dir);
    let file_writer = RollingLog::open(&log_dir, config.app_name, LOG_LIMITS)
        .with_context(|| format!("Failed to open log file in {}", log_dir.display()))?;
    let log_file = file_writer.active_path().to_path_buf();

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(target_filter("debug")));
    let console_level = if config.verbosity > 0 { "debug" } else { "info" };
    let console_filter = EnvFilter::new(target_filter(console_level));

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file_writer))
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .with_level(false)
                .with_filter(console_filter),
        );

    Ok(LogContext {
        dispatch: Dispatch::new(subscriber),
        log_file,
    })
}

fn target_filter(level: &str) -> String {
    LOGTAB_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Get the logtab home directory.
///
/// Priority:
/// 1) LOGTAB_HOME
/// 2) ~/.logtab
/// 3) ./.logtab
pub fn logtab_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("LOGTAB_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".logtab")
}

/// Get the logs directory: ~/.logtab/logs
pub fn logs_dir() -> PathBuf {
    logtab_home().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_events_reach_log_file_inside_scope() {
        let dir = tempdir().unwrap();
        let ctx = init_logging(LogConfig {
            app_name: "logtab",
            verbosity: 1,
            log_dir: Some(dir.path().to_path_buf()),
        })
        .unwrap();

        assert_eq!(ctx.log_file(), dir.path().join("logtab.log"));

        ctx.in_scope(|| {
            tracing::info!(target: "logtab", "inside scope marker");
        });
        tracing::info!(target: "logtab", "outside scope marker");

        let contents = fs::read_to_string(ctx.log_file()).unwrap();
        assert!(contents.contains("inside scope marker"));
        assert!(!contents.contains("outside scope marker"));
    }
}
