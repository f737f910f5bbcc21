// src/exec/classify.rs

//! Turns a raw termination cause into an [`ExecError`].

use std::io;

use crate::errors::{ExecError, ExecErrorKind};
use crate::types::ExecOptions;

/// Why an execution failed, before any output is attached.
#[derive(Debug)]
pub enum Termination {
    /// Spawn failure or output overflow.
    Spawn(io::Error),
    /// Killed by a terminal signal (canonical name).
    Signal(String),
    /// Exited with a non-zero code.
    ExitCode(i32),
}

/// Output captured before the failure.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

pub fn classify(
    termination: Termination,
    cmd: &str,
    options: &ExecOptions,
    captured: Captured,
) -> ExecError {
    let (kind, message, exit_code, signal, cause) = match termination {
        Termination::Spawn(err) => (ExecErrorKind::Spawn, err.to_string(), None, None, Some(err)),
        Termination::Signal(name) => (
            ExecErrorKind::Signal,
            format!("process signaled with {name}"),
            None,
            Some(name),
            None,
        ),
        Termination::ExitCode(code) => (
            ExecErrorKind::ExitCode,
            format!("process exited with exit code {code}"),
            Some(code),
            None,
            None,
        ),
    };

    ExecError {
        kind,
        message,
        cmd: cmd.to_string(),
        options: options.clone(),
        stdout: captured.stdout,
        stderr: captured.stderr,
        exit_code,
        signal,
        cause,
    }
}
