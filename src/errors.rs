// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ExecError`] is the structured failure of one execution. It carries the
//!   command, the options and whatever output was captured before the
//!   execution failed.
//! - [`RawexecError`] covers the layers around the core (config, CLI glue).

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::exec::signals;
use crate::types::ExecOptions;

/// Which kind of termination produced an [`ExecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// The process could not be spawned, or an output channel overflowed.
    Spawn,
    /// The process was killed by a terminal signal.
    Signal,
    /// The process exited with a non-zero status.
    ExitCode,
}

/// Failure of a single execution.
#[derive(Debug)]
pub struct ExecError {
    pub kind: ExecErrorKind,
    pub message: String,
    pub cmd: String,
    pub options: ExecOptions,
    /// Stdout captured up to the moment of failure.
    pub stdout: String,
    /// Stderr captured up to the moment of failure.
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Signal name, e.g. `"SIGTERM"`.
    pub signal: Option<String>,
    pub cause: Option<io::Error>,
}

impl ExecError {
    /// Exit status a shell would report for this failure.
    ///
    /// Non-zero exit codes are passed through, signals map to `128 + signo`
    /// and everything else (spawn failures, overflow) to `1`.
    pub fn exit_status_hint(&self) -> i32 {
        if let Some(code) = self.exit_code {
            return code;
        }
        self.signal
            .as_deref()
            .and_then(signals::signal_number)
            .map(|signo| 128 + signo)
            .unwrap_or(1)
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command failed: {}: {}", self.cmd, self.message)
    }
}

impl StdError for ExecError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

#[derive(Error, Debug)]
pub enum RawexecError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RawexecError>;
