// src/exec/signals.rs

//! Signal policy table.
//!
//! A child may be reported with a signal that does not mean it died: it was
//! stopped, continued, its terminal was resized, or one of its own children
//! changed state. Those signals are listed in [`NON_TERMINAL_SIGNALS`] and the
//! supervisor keeps waiting when it sees one. Every other signal reported at
//! exit fails the execution.

/// Signals that never end an execution.
pub const NON_TERMINAL_SIGNALS: &[&str] = &[
    "SIGSTOP", "SIGTSTP", "SIGTTIN", "SIGTTOU", "SIGCONT", "SIGWINCH", "SIGCHLD", "SIGURG",
];

/// Signal sent to the child on spawn-level failures (overflow).
pub const DEFAULT_TERMINATION_SIGNAL: &str = "SIGTERM";

/// True if `name` is informational and must be ignored at exit.
pub fn is_non_terminal(name: &str) -> bool {
    NON_TERMINAL_SIGNALS.contains(&name)
}

/// Map a raw signal number to its canonical name (`15` -> `"SIGTERM"`).
///
/// Unknown numbers come back as `"SIG<n>"` so they are still reported, and
/// still classified as terminal.
#[cfg(unix)]
pub fn signal_name(signo: i32) -> String {
    use nix::sys::signal::Signal;

    match Signal::try_from(signo) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("SIG{signo}"),
    }
}

#[cfg(not(unix))]
pub fn signal_name(signo: i32) -> String {
    format!("SIG{signo}")
}

/// Inverse of [`signal_name`] for signals known to this platform.
#[cfg(unix)]
pub fn signal_number(name: &str) -> Option<i32> {
    use std::str::FromStr;

    use nix::sys::signal::Signal;

    Signal::from_str(name).ok().map(|sig| sig as i32)
}

#[cfg(not(unix))]
pub fn signal_number(_name: &str) -> Option<i32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_control_and_resize_signals_are_non_terminal() {
        for name in ["SIGSTOP", "SIGTSTP", "SIGCONT", "SIGWINCH", "SIGCHLD"] {
            assert!(is_non_terminal(name), "{name} should be ignored");
        }
    }

    #[test]
    fn kill_signals_are_terminal() {
        for name in ["SIGTERM", "SIGKILL", "SIGINT", "SIGHUP", "SIGSEGV", "SIG99"] {
            assert!(!is_non_terminal(name), "{name} should fail the execution");
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(!is_non_terminal("sigstop"));
    }

    #[cfg(unix)]
    #[test]
    fn names_round_trip_through_numbers() {
        assert_eq!(signal_name(libc::SIGTERM), "SIGTERM");
        assert_eq!(signal_name(libc::SIGKILL), "SIGKILL");
        assert_eq!(signal_number("SIGTERM"), Some(libc::SIGTERM));
        assert_eq!(signal_number("SIGBOGUS"), None);
    }

    #[cfg(unix)]
    #[test]
    fn unknown_numbers_get_a_synthetic_name() {
        assert_eq!(signal_name(1000), "SIG1000");
    }
}
