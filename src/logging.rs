// src/logging.rs

//! Diagnostics for the `rawexec` binary.
//!
//! The child's stderr is forwarded to our stderr verbatim, so diagnostics
//! default to `warn` and only get louder on request: `--log-level` wins over
//! `RAWEXEC_LOG`, which wins over the default.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "RAWEXEC_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_level = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_level.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install the tracing subscriber: {e}"))
}

/// Pick the effective level. An unparsable env value falls back to `warn`.
fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    if let Some(lvl) = cli_level {
        return lvl.into();
    }
    env_value
        .and_then(|value| value.trim().parse::<Level>().ok())
        .unwrap_or(Level::WARN)
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment() {
        assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    }

    #[test]
    fn environment_is_trimmed_and_case_insensitive() {
        assert_eq!(resolve_level(None, Some(" Debug ")), Level::DEBUG);
    }

    #[test]
    fn unknown_or_missing_environment_means_warn() {
        assert_eq!(resolve_level(None, Some("loud")), Level::WARN);
        assert_eq!(resolve_level(None, None), Level::WARN);
    }
}
