// src/exec/supervisor.rs

//! Async shell around [`Execution`].
//!
//! Three event sources feed one execution: the stdout pump, the stderr pump
//! (both delivering over an mpsc channel) and the child's wait future. The
//! supervisor multiplexes them with `tokio::select!`, hands every event to the
//! pure core, and performs the cleanup the core asks for once it settles.
//!
//! Once the child has exited, its pipes get [`PIPE_DRAIN_TIMEOUT`] to reach
//! end-of-stream. A background process that inherited them can keep them open
//! indefinitely, so after that window the execution settles with whatever was
//! captured and the pumps are aborted.

use std::io;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use super::core::{Execution, Settlement, Step};
use super::process::{self, ProcessHandle};
use super::{ExitReport, ProcessEvent};
use crate::errors::ExecError;
use crate::types::{ExecOptions, ExecResult};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How long the pipes may stay open after the child exited.
pub const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// Run `cmd` through a shell and capture its output.
///
/// Settles exactly once: with the captured output if the process exits with
/// code 0, otherwise with an [`ExecError`] carrying whatever was captured up
/// to that point.
pub async fn execute(cmd: &str, options: ExecOptions) -> Result<ExecResult, ExecError> {
    info!(
        cmd,
        max_buffer = options.resolved_max_buffer(),
        shell = %options.shell,
        "starting execution"
    );

    let execution = Execution::new(cmd, options);
    let (tx, rx) = mpsc::channel::<ProcessEvent>(EVENT_CHANNEL_CAPACITY);

    let handle = match process::spawn(cmd, execution.options(), tx) {
        Ok(handle) => handle,
        Err(err) => {
            debug!(cmd, error = %err, "spawn failed");
            // Nothing was started, so there is nothing to terminate.
            return execution.fail(err).outcome;
        }
    };

    supervise(execution, handle, rx).await
}

async fn supervise(
    mut execution: Execution,
    mut handle: ProcessHandle,
    mut rx: mpsc::Receiver<ProcessEvent>,
) -> Result<ExecResult, ExecError> {
    let mut waiting = true;
    let mut draining = false;
    let drain = time::sleep(PIPE_DRAIN_TIMEOUT);
    tokio::pin!(drain);

    loop {
        let step = tokio::select! {
            status = handle.wait(), if waiting => {
                // Tokio only reports final statuses; stop/continue
                // notifications never surface here, so one status is all
                // there is to wait for.
                waiting = false;
                let event = match status {
                    Ok(status) => {
                        draining = true;
                        drain.as_mut().reset(Instant::now() + PIPE_DRAIN_TIMEOUT);
                        ProcessEvent::Exited(ExitReport::from(status))
                    }
                    Err(err) => ProcessEvent::SpawnFailed(err),
                };
                execution.step(event)
            }
            Some(event) = rx.recv() => execution.step(event),
            () = &mut drain, if draining => {
                draining = false;
                execution.abandon_open_channels()
            }
            else => break,
        };

        if let Step::Settled(settlement) = step {
            return finish(settlement, handle);
        }
    }

    let cause = io::Error::other("process event sources closed before the execution settled");
    finish(execution.fail(cause), handle)
}

/// Perform the cleanup requested by the core and hand back the outcome.
fn finish(settlement: Settlement, handle: ProcessHandle) -> Result<ExecResult, ExecError> {
    match settlement.terminate_with {
        Some(signal) => {
            let delivered = process::terminate(handle, &signal);
            debug!(signal = %signal, delivered, "terminated child after settlement");
        }
        None => handle.release(),
    }
    settlement.outcome
}
