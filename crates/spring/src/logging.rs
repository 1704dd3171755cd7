//! Tracing subscriber setup
//!
//! Headless commands log to stderr. The TUI owns the terminal, so its logs
//! go to a daily rolling file instead.

use anyhow::Result;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const APP_NAME: &str = "spring";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("{APP_NAME}=info")))
}

/// Directory holding TUI log files
pub fn log_dir() -> PathBuf {
    match dirs::data_local_dir() {
        Some(dir) => dir.join(APP_NAME).join("logs"),
        None => PathBuf::from("logs"),
    }
}

/// Log to stderr
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Log to a daily rolling file; logs are flushed when the guard drops
pub fn init_file() -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(log_dir(), format!("{APP_NAME}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install file logger: {e}"))?;

    Ok(guard)
}
