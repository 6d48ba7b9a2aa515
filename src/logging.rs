// ABOUTME: Logging setup — tracing to a daily-rolling file, since the terminal belongs to the TUI.
// ABOUTME: RUST_LOG wins over the --log-level flag when both are set.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// File name prefix of the rolling log.
pub const LOG_FILE_PREFIX: &str = "sessionchat.log";

/// Build the filter from RUST_LOG, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_for(from_env.as_deref(), default_level)
}

/// The first of `directives` and `default_level` that parses, else `info`.
fn filter_for(directives: Option<&str>, default_level: &str) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(default_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global subscriber writing to `log_dir`. Keep the returned guard
/// alive for the life of the program so buffered lines are flushed.
pub fn init(log_dir: &Path, default_level: &str) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    Ok(guard)
}
