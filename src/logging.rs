//! Tracing setup for the command-line binary

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::LOG_ENV;

/// Filter used when `GITBOOK_LOG` is unset or invalid
fn default_directive(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_directive(debug).into())
        .with_env_var(LOG_ENV)
        .from_env_lossy()
}

/// Install the global subscriber.
///
/// Everything passing the filter is appended to `log_path` as JSON;
/// warnings and errors (everything with `debug`) are also printed to stderr.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(log_path: &Path, debug: bool) -> anyhow::Result<WorkerGuard> {
    let log_dir = log_path.parent().unwrap_or(Path::new("."));
    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("invalid log path: {}", log_path.display()))?;
    std::fs::create_dir_all(log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, file_name));

    let stderr_level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_filter(stderr_level),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_follows_debug_flag() {
        assert_eq!(default_directive(false), LevelFilter::INFO);
        assert_eq!(default_directive(true), LevelFilter::DEBUG);
    }
}
