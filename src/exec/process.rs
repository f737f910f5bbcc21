// src/exec/process.rs

//! Child process ownership: spawning, termination and release.
//!
//! - [`spawn`] builds the shell command, starts the child in its own session
//!   on Unix and hands both pipes to [`limiter::pump`] tasks.
//! - [`ProcessHandle`] owns the child and the pump tasks. Both ways of giving
//!   it up ([`terminate`] and [`ProcessHandle::release`]) consume it, so the
//!   handle is released exactly once whichever path settles the execution.
//!
//! Only the child PID is signaled. Signaling the whole process group
//! (negative PID) is not implemented yet.
//!
//! [`limiter::pump`]: super::limiter::pump

use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::limiter::pump;
use super::{Channel, ProcessEvent};
use crate::types::{ExecOptions, ShellOption, StdinMode};

/// A live child plus the tasks reading its output channels.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    pumps: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    /// PID of the child, or `None` once it has been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the child to report a status.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Give up the handle after a clean settlement. The pumps have normally
    /// finished by now; aborting them is a no-op in that case.
    pub fn release(self) {
        close_streams(&self.pumps);
        detach(self.child);
    }
}

/// Program and leading arguments used to run `cmd` through a shell.
pub fn shell_command(cmd: &str, shell: &ShellOption) -> (OsString, Vec<OsString>) {
    match shell {
        ShellOption::Path(path) => {
            let flag = if is_cmd_exe(path.as_os_str()) { "/C" } else { "-c" };
            (path.clone().into_os_string(), vec![flag.into(), cmd.into()])
        }
        ShellOption::Default(_) => default_shell(cmd),
    }
}

#[cfg(unix)]
fn default_shell(cmd: &str) -> (OsString, Vec<OsString>) {
    ("/bin/sh".into(), vec!["-c".into(), cmd.into()])
}

#[cfg(not(unix))]
fn default_shell(cmd: &str) -> (OsString, Vec<OsString>) {
    let comspec = std::env::var_os("ComSpec").unwrap_or_else(|| "cmd.exe".into());
    (
        comspec,
        vec!["/d".into(), "/s".into(), "/c".into(), cmd.into()],
    )
}

fn is_cmd_exe(program: &std::ffi::OsStr) -> bool {
    std::path::Path::new(program)
        .file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("cmd"))
}

fn build_command(cmd: &str, options: &ExecOptions) -> Command {
    let (program, args) = shell_command(cmd, &options.shell);
    let mut command = Command::new(program);
    command.args(args);

    if let Some(ref cwd) = options.cwd {
        command.current_dir(cwd);
    }
    if options.spawn.env_clear {
        command.env_clear();
    }
    command.envs(&options.env);

    match options.spawn.stdin {
        StdinMode::Null => command.stdin(Stdio::null()),
        StdinMode::Inherit => command.stdin(Stdio::inherit()),
    };
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(options.spawn.kill_on_drop);

    #[cfg(unix)]
    unsafe {
        // Runs between fork and exec in the child: only async-signal-safe
        // calls are allowed here.
        command.pre_exec(start_new_session);
    }

    command
}

/// Start a new session so the child is detached from our process group.
/// Falls back to a fresh process group if the child is already a session
/// leader.
#[cfg(unix)]
fn start_new_session() -> io::Result<()> {
    if unsafe { libc::setsid() } == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EPERM) {
            return Err(err);
        }
        if unsafe { libc::setpgid(0, 0) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Spawn `cmd` through the configured shell and start pumping its output
/// into `events`.
pub fn spawn(
    cmd: &str,
    options: &ExecOptions,
    events: mpsc::Sender<ProcessEvent>,
) -> io::Result<ProcessHandle> {
    let mut child = build_command(cmd, options).spawn()?;
    debug!(cmd, pid = ?child.id(), "spawned child process");

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(tokio::spawn(pump(stdout, Channel::Stdout, events.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(tokio::spawn(pump(stderr, Channel::Stderr, events)));
    }

    Ok(ProcessHandle { child, pumps })
}

/// Close both output streams, send `signal` to the child and release the
/// handle.
///
/// Returns whether the signal was delivered. Every failure along the way is
/// logged and swallowed; this never interferes with the settlement in
/// progress.
pub fn terminate(handle: ProcessHandle, signal: &str) -> bool {
    let ProcessHandle { mut child, pumps } = handle;

    close_streams(&pumps);
    let delivered = match send_signal(&mut child, signal) {
        Ok(()) => true,
        Err(e) => {
            debug!(signal, error = %e, "termination signal not delivered");
            false
        }
    };
    // Detach only after signaling: while we hold the child its PID cannot be
    // reaped and recycled.
    detach(child);
    delivered
}

/// Aborting a pump drops its pipe end, so no further chunks are read.
fn close_streams(pumps: &[JoinHandle<()>]) {
    for pump in pumps {
        pump.abort();
    }
}

/// Hand the child over to Tokio, which reaps it in the background.
fn detach(child: Child) {
    drop(child);
}

#[cfg(unix)]
fn send_signal(child: &mut Child, signal: &str) -> io::Result<()> {
    use std::str::FromStr;

    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped; nothing left to signal.
        return Err(io::Error::new(io::ErrorKind::NotFound, "process already exited"));
    };
    let sig = Signal::from_str(signal).map_err(io::Error::from)?;
    let pid = i32::try_from(pid).map_err(io::Error::other)?;

    kill(Pid::from_raw(pid), sig).map_err(|errno| {
        warn!(pid, signal, error = %errno, "failed to signal child process");
        io::Error::from(errno)
    })
}

#[cfg(not(unix))]
fn send_signal(child: &mut Child, _signal: &str) -> io::Result<()> {
    // No signals here; any termination request becomes a hard kill.
    child.start_kill()
}
