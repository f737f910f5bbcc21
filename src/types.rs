// src/types.rs

//! Options and results shared by the execution core and the outer layers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Buffer limit applied to each output channel when none is configured.
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

/// Which shell runs the command line.
///
/// Execution always goes through a shell. `true`/`false` both select the
/// platform default (`/bin/sh` or `cmd.exe`); a string names an explicit
/// shell binary.
///
/// ```toml
/// shell = true
/// shell = "/bin/bash"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ShellOption {
    Default(bool),
    Path(PathBuf),
}

impl Default for ShellOption {
    fn default() -> Self {
        ShellOption::Default(true)
    }
}

impl fmt::Display for ShellOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellOption::Default(_) => f.write_str("<default shell>"),
            ShellOption::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// What the child sees on stdin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdinMode {
    /// Connected to the null device (immediate EOF).
    #[default]
    Null,
    /// Inherited from the parent.
    Inherit,
}

/// Extra knobs forwarded to the spawn call as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    /// Start from an empty environment instead of inheriting the parent's.
    pub env_clear: bool,

    pub stdin: StdinMode,

    /// Kill the child if the execution future is dropped before settling.
    pub kill_on_drop: bool,
}

/// Options for a single execution. Never mutated while the child runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExecOptions {
    /// Working directory; `None` inherits the parent's.
    pub cwd: Option<PathBuf>,

    /// Variables set on top of the inherited (or cleared) environment.
    pub env: BTreeMap<String, String>,

    pub shell: ShellOption,

    /// Per-channel byte limit. `None` means [`DEFAULT_MAX_BUFFER`].
    pub max_buffer: Option<usize>,

    #[serde(flatten)]
    pub spawn: SpawnOptions,
}

impl ExecOptions {
    /// The effective per-channel limit.
    pub fn resolved_max_buffer(&self) -> usize {
        self.max_buffer.unwrap_or(DEFAULT_MAX_BUFFER)
    }
}

/// Captured output of a successful execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
}
