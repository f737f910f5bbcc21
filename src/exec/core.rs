// src/exec/core.rs

//! Pure execution state machine.
//!
//! [`Execution`] consumes [`ProcessEvent`]s and decides when the execution
//! settles and with what. It owns both channel limiters (and thus the
//! captured output) and has no Tokio types, no channels and no processes, so
//! every interleaving of events can be unit tested directly.
//!
//! Settlement rules:
//! - spawn failure or channel overflow settles immediately as a spawn-level
//!   failure and asks the shell to send `SIGTERM`;
//! - an exit carrying a non-terminal signal is ignored;
//! - any other exit is recorded and the execution settles once both channels
//!   have closed, or once the shell gives up waiting for them
//!   ([`Execution::abandon_open_channels`]);
//! - with an exit recorded, the exit status alone decides the outcome: a late
//!   chunk that overflows only stops capture on its channel;
//! - after settling, every event is ignored.

use std::io;

use tracing::{debug, info};

use super::classify::{self, Captured, Termination};
use super::limiter::{Admission, StreamLimiter};
use super::signals::DEFAULT_TERMINATION_SIGNAL;
use super::{Channel, ExitReport, ProcessEvent};
use crate::errors::ExecError;
use crate::types::{ExecOptions, ExecResult};

/// Final outcome plus the cleanup the IO shell must perform.
#[derive(Debug)]
pub struct Settlement {
    pub outcome: std::result::Result<ExecResult, ExecError>,
    /// Signal to deliver to the child before releasing it, if any.
    pub terminate_with: Option<String>,
}

/// Result of feeding one event into the core.
#[derive(Debug)]
pub enum Step {
    /// Still waiting for more events.
    Pending,
    /// The execution just settled. Returned at most once.
    Settled(Settlement),
    /// The execution had already settled; the event was discarded.
    Ignored,
}

#[derive(Debug)]
pub struct Execution {
    cmd: String,
    options: ExecOptions,
    stdout: StreamLimiter,
    stderr: StreamLimiter,
    stdout_open: bool,
    stderr_open: bool,
    exit: Option<ExitReport>,
    settled: bool,
}

impl Execution {
    pub fn new(cmd: impl Into<String>, options: ExecOptions) -> Self {
        let max_buffer = options.resolved_max_buffer();
        Self {
            cmd: cmd.into(),
            options,
            stdout: StreamLimiter::new(Channel::Stdout, max_buffer),
            stderr: StreamLimiter::new(Channel::Stderr, max_buffer),
            stdout_open: true,
            stderr_open: true,
            exit: None,
            settled: false,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Handle a single event.
    pub fn step(&mut self, event: ProcessEvent) -> Step {
        if self.settled {
            debug!(cmd = %self.cmd, "event after settlement; ignoring");
            return Step::Ignored;
        }

        match event {
            ProcessEvent::Chunk { channel, bytes } => self.on_chunk(channel, bytes),
            ProcessEvent::Closed(channel) => {
                self.close(channel);
                self.try_finish()
            }
            ProcessEvent::Exited(report) => self.on_exit(report),
            ProcessEvent::SpawnFailed(err) => Step::Settled(self.fail_spawn(err)),
        }
    }

    /// Settle with a spawn-level failure without waiting for further events.
    ///
    /// Used when the child never started, or when every event source went
    /// away before the core reached a decision. Consumes the execution, so
    /// nothing can settle it again afterwards.
    pub fn fail(mut self, cause: io::Error) -> Settlement {
        debug_assert!(!self.settled, "execution already settled");
        self.fail_spawn(cause)
    }

    /// Stop waiting for end-of-stream on channels that are still open and
    /// settle from the recorded exit.
    ///
    /// Called once the child has exited but a descendant still holds its
    /// pipes. Stays pending if no exit has been recorded yet.
    pub fn abandon_open_channels(&mut self) -> Step {
        if self.settled {
            return Step::Ignored;
        }
        if self.exit.is_some() && (self.stdout_open || self.stderr_open) {
            debug!(
                cmd = %self.cmd,
                stdout_open = self.stdout_open,
                stderr_open = self.stderr_open,
                "pipes still open after exit; settling with captured output"
            );
            self.stdout_open = false;
            self.stderr_open = false;
        }
        self.try_finish()
    }

    fn on_chunk(&mut self, channel: Channel, bytes: Vec<u8>) -> Step {
        let exited = self.exit.is_some();
        let limiter = match channel {
            Channel::Stdout => &mut self.stdout,
            Channel::Stderr => &mut self.stderr,
        };

        match limiter.admit(bytes) {
            Admission::Appended | Admission::Dropped => Step::Pending,
            Admission::Overflowed if exited => {
                debug!(cmd = %self.cmd, %channel, "output limit reached after exit; channel no longer captured");
                self.close(channel);
                self.try_finish()
            }
            Admission::Overflowed => {
                let message = limiter.overflow_message();
                Step::Settled(self.fail_spawn(io::Error::other(message)))
            }
        }
    }

    fn close(&mut self, channel: Channel) {
        match channel {
            Channel::Stdout => self.stdout_open = false,
            Channel::Stderr => self.stderr_open = false,
        }
    }

    fn on_exit(&mut self, report: ExitReport) -> Step {
        if report.is_non_terminal() {
            debug!(
                cmd = %self.cmd,
                signal = ?report.signal,
                "non-terminal signal reported; still waiting"
            );
            return Step::Pending;
        }

        debug!(cmd = %self.cmd, code = ?report.code, signal = ?report.signal, "process exited");
        self.exit = Some(report);
        self.try_finish()
    }

    fn try_finish(&mut self) -> Step {
        if self.stdout_open || self.stderr_open {
            return Step::Pending;
        }
        let Some(report) = self.exit.take() else {
            return Step::Pending;
        };

        match (report.signal, report.code) {
            (Some(signal), _) => {
                let err = self.failure(Termination::Signal(signal.clone()));
                Step::Settled(self.settle(Err(err), Some(signal)))
            }
            (None, Some(0)) => {
                let result = ExecResult {
                    stdout: self.stdout.buffer().materialize(),
                    stderr: self.stderr.buffer().materialize(),
                };
                Step::Settled(self.settle(Ok(result), None))
            }
            (None, code) => {
                let err = self.failure(Termination::ExitCode(code.unwrap_or(-1)));
                Step::Settled(self.settle(Err(err), None))
            }
        }
    }

    fn fail_spawn(&mut self, cause: io::Error) -> Settlement {
        let err = self.failure(Termination::Spawn(cause));
        self.settle(Err(err), Some(DEFAULT_TERMINATION_SIGNAL.to_string()))
    }

    fn failure(&self, termination: Termination) -> ExecError {
        let captured = Captured {
            stdout: self.stdout.buffer().materialize(),
            stderr: self.stderr.buffer().materialize(),
        };
        classify::classify(termination, &self.cmd, &self.options, captured)
    }

    fn settle(
        &mut self,
        outcome: std::result::Result<ExecResult, ExecError>,
        terminate_with: Option<String>,
    ) -> Settlement {
        self.settled = true;
        match &outcome {
            Ok(_) => info!(cmd = %self.cmd, "execution succeeded"),
            Err(err) => info!(cmd = %self.cmd, kind = ?err.kind, error = %err.message, "execution failed"),
        }
        Settlement {
            outcome,
            terminate_with,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecErrorKind;

    fn execution(max_buffer: usize) -> Execution {
        Execution::new(
            "test-cmd",
            ExecOptions {
                max_buffer: Some(max_buffer),
                ..Default::default()
            },
        )
    }

    fn chunk(channel: Channel, bytes: &str) -> ProcessEvent {
        ProcessEvent::Chunk {
            channel,
            bytes: bytes.as_bytes().to_vec(),
        }
    }

    fn close_both(exec: &mut Execution) -> Step {
        assert!(matches!(exec.step(ProcessEvent::Closed(Channel::Stdout)), Step::Pending));
        exec.step(ProcessEvent::Closed(Channel::Stderr))
    }

    fn expect_settled(step: Step) -> Settlement {
        match step {
            Step::Settled(s) => s,
            other => panic!("expected settlement, got {other:?}"),
        }
    }

    #[test]
    fn clean_exit_after_close_succeeds() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "hel"));
        exec.step(chunk(Channel::Stderr, "warn"));
        exec.step(chunk(Channel::Stdout, "lo"));
        assert!(matches!(exec.step(ProcessEvent::Exited(ExitReport::code(0))), Step::Pending));

        let settlement = expect_settled(close_both(&mut exec));
        let result = settlement.outcome.expect("should succeed");
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.stderr, "warn");
        assert!(settlement.terminate_with.is_none());
    }

    #[test]
    fn exit_may_arrive_after_streams_close() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "out"));
        assert!(matches!(close_both(&mut exec), Step::Pending));

        let settlement = expect_settled(exec.step(ProcessEvent::Exited(ExitReport::code(0))));
        assert_eq!(settlement.outcome.unwrap().stdout, "out");
    }

    #[test]
    fn non_zero_exit_reports_code_and_partial_output() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stderr, "boom"));
        exec.step(ProcessEvent::Exited(ExitReport::code(2)));

        let settlement = expect_settled(close_both(&mut exec));
        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::ExitCode);
        assert_eq!(err.exit_code, Some(2));
        assert_eq!(err.stderr, "boom");
        assert!(settlement.terminate_with.is_none());
    }

    #[test]
    fn terminal_signal_fails_and_requests_same_signal() {
        let mut exec = execution(1024);
        exec.step(ProcessEvent::Exited(ExitReport::signal("SIGKILL")));

        let settlement = expect_settled(close_both(&mut exec));
        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::Signal);
        assert_eq!(err.signal.as_deref(), Some("SIGKILL"));
        assert_eq!(err.message, "process signaled with SIGKILL");
        assert_eq!(settlement.terminate_with.as_deref(), Some("SIGKILL"));
    }

    #[test]
    fn stop_continue_cycle_before_clean_exit_succeeds() {
        let mut exec = execution(1024);
        assert!(matches!(
            exec.step(ProcessEvent::Exited(ExitReport::signal("SIGSTOP"))),
            Step::Pending
        ));
        assert!(matches!(
            exec.step(ProcessEvent::Exited(ExitReport::signal("SIGCONT"))),
            Step::Pending
        ));
        exec.step(chunk(Channel::Stdout, "done"));
        assert!(matches!(close_both(&mut exec), Step::Pending));

        let settlement = expect_settled(exec.step(ProcessEvent::Exited(ExitReport::code(0))));
        assert_eq!(settlement.outcome.unwrap().stdout, "done");
    }

    #[test]
    fn non_terminal_signal_alone_never_settles() {
        let mut exec = execution(1024);
        exec.step(ProcessEvent::Exited(ExitReport::signal("SIGWINCH")));
        assert!(matches!(close_both(&mut exec), Step::Pending));
        assert!(!exec.is_settled());
    }

    #[test]
    fn overflow_settles_immediately_with_spawn_failure() {
        let mut exec = execution(5);
        assert!(matches!(exec.step(chunk(Channel::Stdout, "abc")), Step::Pending));

        let settlement = expect_settled(exec.step(chunk(Channel::Stdout, "def")));
        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::Spawn);
        assert_eq!(err.message, "stdout maxBuffer exceeded");
        assert_eq!(err.stdout, "abc");
        assert!(err.cause.is_some());
        assert_eq!(settlement.terminate_with.as_deref(), Some("SIGTERM"));
    }

    #[test]
    fn channels_are_limited_independently() {
        let mut exec = execution(4);
        assert!(matches!(exec.step(chunk(Channel::Stdout, "1234")), Step::Pending));
        assert!(matches!(exec.step(chunk(Channel::Stderr, "1234")), Step::Pending));

        let settlement = expect_settled(exec.step(chunk(Channel::Stderr, "5")));
        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.message, "stderr maxBuffer exceeded");
        assert_eq!(err.stdout, "1234");
        assert_eq!(err.stderr, "1234");
    }

    #[test]
    fn first_settlement_wins() {
        let mut exec = execution(2);
        expect_settled(exec.step(chunk(Channel::Stdout, "overflow")));

        assert!(matches!(exec.step(ProcessEvent::Exited(ExitReport::code(0))), Step::Ignored));
        assert!(matches!(exec.step(ProcessEvent::Closed(Channel::Stdout)), Step::Ignored));
        assert!(matches!(exec.step(ProcessEvent::Closed(Channel::Stderr)), Step::Ignored));
        assert!(matches!(
            exec.step(ProcessEvent::SpawnFailed(io::Error::other("late"))),
            Step::Ignored
        ));
    }

    #[test]
    fn spawn_failure_carries_os_error() {
        let mut exec = execution(1024);
        let cause = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let settlement = expect_settled(exec.step(ProcessEvent::SpawnFailed(cause)));

        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::Spawn);
        assert_eq!(err.cause.as_ref().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
        assert_eq!(err.stdout, "");
    }

    #[test]
    fn no_chunks_are_kept_after_settlement() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "before"));
        exec.step(ProcessEvent::Exited(ExitReport::code(1)));
        let err = expect_settled(close_both(&mut exec)).outcome.unwrap_err();
        assert_eq!(err.stdout, "before");

        assert!(matches!(exec.step(chunk(Channel::Stdout, "after")), Step::Ignored));
    }

    #[test]
    fn missing_code_and_signal_is_treated_as_failure() {
        let mut exec = execution(1024);
        exec.step(ProcessEvent::Exited(ExitReport::default()));
        let err = expect_settled(close_both(&mut exec)).outcome.unwrap_err();
        assert_eq!(err.exit_code, Some(-1));
    }

    #[test]
    fn fail_settles_with_spawn_failure() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "partial"));

        let settlement = exec.fail(io::Error::other("event sources closed"));
        let err = settlement.outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::Spawn);
        assert_eq!(err.stdout, "partial");
        assert_eq!(settlement.terminate_with.as_deref(), Some("SIGTERM"));
    }

    #[test]
    fn overflow_after_clean_exit_keeps_success() {
        let mut exec = execution(8);
        exec.step(chunk(Channel::Stdout, "hi"));
        assert!(matches!(exec.step(ProcessEvent::Exited(ExitReport::code(0))), Step::Pending));
        assert!(matches!(exec.step(ProcessEvent::Closed(Channel::Stderr)), Step::Pending));

        // A background writer pushes stdout past the limit after the shell exited.
        let settlement = expect_settled(exec.step(chunk(Channel::Stdout, "0123456789abcdef")));
        let result = settlement.outcome.expect("exit status 0 decides the outcome");
        assert_eq!(result.stdout, "hi");
        assert!(settlement.terminate_with.is_none());
    }

    #[test]
    fn overflow_after_non_zero_exit_reports_exit_code() {
        let mut exec = execution(4);
        exec.step(ProcessEvent::Exited(ExitReport::code(3)));
        assert!(matches!(exec.step(chunk(Channel::Stderr, "too long")), Step::Pending));

        let err = expect_settled(exec.abandon_open_channels()).outcome.unwrap_err();
        assert_eq!(err.kind, ExecErrorKind::ExitCode);
        assert_eq!(err.exit_code, Some(3));
        assert_eq!(err.stderr, "");
    }

    #[test]
    fn abandoning_open_channels_settles_from_recorded_exit() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "hi\n"));
        exec.step(ProcessEvent::Exited(ExitReport::code(0)));
        assert!(matches!(exec.step(ProcessEvent::Closed(Channel::Stderr)), Step::Pending));

        let settlement = expect_settled(exec.abandon_open_channels());
        assert_eq!(settlement.outcome.unwrap().stdout, "hi\n");
        assert!(matches!(exec.step(chunk(Channel::Stdout, "late")), Step::Ignored));
        assert!(matches!(exec.abandon_open_channels(), Step::Ignored));
    }

    #[test]
    fn abandoning_without_exit_stays_pending() {
        let mut exec = execution(1024);
        exec.step(chunk(Channel::Stdout, "partial"));
        assert!(matches!(exec.abandon_open_channels(), Step::Pending));
        assert!(!exec.is_settled());

        let settlement = expect_settled({
            exec.step(ProcessEvent::Exited(ExitReport::code(0)));
            close_both(&mut exec)
        });
        assert_eq!(settlement.outcome.unwrap().stdout, "partial");
    }
}
