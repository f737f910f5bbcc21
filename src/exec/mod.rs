// src/exec/mod.rs

//! Process execution layer.
//!
//! One call to [`execute`] spawns a shell command, captures stdout/stderr
//! under a byte limit and settles exactly once with an [`ExecResult`] or an
//! [`ExecError`](crate::errors::ExecError).
//!
//! - [`buffer`] holds the raw output of one channel.
//! - [`limiter`] enforces `max_buffer` and pumps pipe reads into events.
//! - [`signals`] is the static terminal / non-terminal signal table.
//! - [`classify`] builds the structured failure.
//! - [`core`] is the pure state machine deciding when and how to settle.
//! - [`process`] owns the child: spawning, termination and release.
//! - [`supervisor`] is the async shell driving the core from real events.
//! - [`backend`] provides the `Executor` trait the outer layers depend on.
//!
//! [`ExecResult`]: crate::types::ExecResult

use std::fmt;
use std::io;
use std::process::ExitStatus;

pub mod backend;
pub mod buffer;
pub mod classify;
pub mod core;
pub mod limiter;
pub mod process;
pub mod signals;
pub mod supervisor;

pub use backend::{ExecFuture, Executor, RealExecutor};
pub use self::core::{Execution, Settlement, Step};
pub use process::{ProcessHandle, terminate};
pub use supervisor::execute;

/// One of the two captured output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Stdout => f.write_str("stdout"),
            Channel::Stderr => f.write_str("stderr"),
        }
    }
}

/// How the child reported its termination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExitReport {
    pub code: Option<i32>,
    /// Canonical signal name, e.g. `"SIGTERM"`.
    pub signal: Option<String>,
}

impl ExitReport {
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn signal(name: impl Into<String>) -> Self {
        Self {
            code: None,
            signal: Some(name.into()),
        }
    }

    /// True if the reported signal is informational (stop, continue, ...).
    pub fn is_non_terminal(&self) -> bool {
        self.signal
            .as_deref()
            .is_some_and(signals::is_non_terminal)
    }
}

impl From<ExitStatus> for ExitReport {
    #[cfg(unix)]
    fn from(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        Self {
            code: status.code(),
            signal: status.signal().map(signals::signal_name),
        }
    }

    #[cfg(not(unix))]
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: None,
        }
    }
}

/// Events flowing from the pipes and the child into the supervisor.
#[derive(Debug)]
pub enum ProcessEvent {
    /// Raw bytes read from one channel.
    Chunk { channel: Channel, bytes: Vec<u8> },
    /// The channel reached end-of-stream.
    Closed(Channel),
    /// The child reported a termination status.
    Exited(ExitReport),
    /// The child could not be spawned or waited on.
    SpawnFailed(io::Error),
}
