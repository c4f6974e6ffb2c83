// src/logging.rs

//! Log output for `taskpipe`.
//!
//! Each task run logs its start and completion at `info`; stage progress and
//! watch bookkeeping (debounce restarts, queued reruns) log at `debug`.
//! Everything goes to stderr so `list` and `--dry-run` output on stdout
//! stays clean.
//!
//! The filter comes from `--log-level`, else from `TASKPIPE_LOG`, which
//! takes full `tracing` directives (`debug`, `taskpipe::engine=trace`),
//! else `info`.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable read when `--log-level` is absent.
pub const LOG_ENV: &str = "TASKPIPE_LOG";

/// Install the global subscriber. Fails if one is already installed or
/// `TASKPIPE_LOG` doesn't parse.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = log_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

/// Filter for a CLI level and a raw `TASKPIPE_LOG` value.
pub fn log_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(directive(level)));
    }
    match env.map(str::trim) {
        Some(spec) if !spec.is_empty() => {
            EnvFilter::try_new(spec).map_err(|e| anyhow!("invalid {LOG_ENV} value {spec:?}: {e}"))
        }
        _ => Ok(EnvFilter::new("info")),
    }
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
