// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! Code that needs to run commands (the git version check, the CLI) talks to
//! an `Executor` instead of calling [`execute`] directly. Production code uses
//! [`RealExecutor`]; tests can provide an implementation that returns
//! scripted results without spawning anything.

use std::future::Future;
use std::pin::Pin;

use crate::errors::ExecError;
use crate::types::{ExecOptions, ExecResult};

use super::supervisor::execute;

/// Future returned by [`Executor::exec`].
pub type ExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ExecResult, ExecError>> + Send + 'a>>;

/// Trait abstracting how a command line is executed.
pub trait Executor: Send + Sync {
    fn exec<'a>(&'a self, cmd: &'a str, options: ExecOptions) -> ExecFuture<'a>;
}

/// Executor that spawns real processes through [`execute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RealExecutor;

impl Executor for RealExecutor {
    fn exec<'a>(&'a self, cmd: &'a str, options: ExecOptions) -> ExecFuture<'a> {
        Box::pin(execute(cmd, options))
    }
}
