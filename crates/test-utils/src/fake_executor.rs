use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rawexec::errors::{ExecError, ExecErrorKind};
use rawexec::exec::{ExecFuture, Executor};
use rawexec::types::{ExecOptions, ExecResult};

/// Scripted response for one command.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Success { stdout: String, stderr: String },
    ExitCode { code: i32, stderr: String },
    SpawnFailure { message: String },
}

impl FakeResponse {
    pub fn stdout(text: &str) -> Self {
        FakeResponse::Success {
            stdout: text.to_string(),
            stderr: String::new(),
        }
    }

    fn into_outcome(self, cmd: &str, options: ExecOptions) -> Result<ExecResult, ExecError> {
        let failure = |kind, message: String, exit_code, stderr: String, cause| ExecError {
            kind,
            message,
            cmd: cmd.to_string(),
            options: options.clone(),
            stdout: String::new(),
            stderr,
            exit_code,
            signal: None,
            cause,
        };

        match self {
            FakeResponse::Success { stdout, stderr } => Ok(ExecResult { stdout, stderr }),
            FakeResponse::ExitCode { code, stderr } => Err(failure(
                ExecErrorKind::ExitCode,
                format!("process exited with exit code {code}"),
                Some(code),
                stderr,
                None,
            )),
            FakeResponse::SpawnFailure { message } => Err(failure(
                ExecErrorKind::Spawn,
                message.clone(),
                None,
                String::new(),
                Some(std::io::Error::new(std::io::ErrorKind::NotFound, message)),
            )),
        }
    }
}

/// A fake executor that:
/// - records every command it was asked to run
/// - answers with scripted responses (per command, in order), or a spawn
///   failure for commands with no script left.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    responses: Arc<Mutex<HashMap<String, VecDeque<FakeResponse>>>>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, cmd: &str, response: FakeResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(cmd.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl Executor for FakeExecutor {
    fn exec<'a>(&'a self, cmd: &'a str, options: ExecOptions) -> ExecFuture<'a> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(cmd.to_string());

            let response = self
                .responses
                .lock()
                .unwrap()
                .get_mut(cmd)
                .and_then(|queue| queue.pop_front())
                .unwrap_or_else(|| FakeResponse::SpawnFailure {
                    message: format!("no scripted response for '{cmd}'"),
                });

            response.into_outcome(cmd, options)
        })
    }
}
