#![allow(dead_code)]

use std::path::Path;

use rawexec::types::{ExecOptions, ShellOption};

/// Builder for `ExecOptions` to simplify test setup.
#[derive(Default)]
pub struct ExecOptionsBuilder {
    options: ExecOptions,
}

impl ExecOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_buffer(mut self, bytes: usize) -> Self {
        self.options.max_buffer = Some(bytes);
        self
    }

    pub fn shell(mut self, path: impl AsRef<Path>) -> Self {
        self.options.shell = ShellOption::Path(path.as_ref().to_path_buf());
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.options.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.options.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env_clear(mut self) -> Self {
        self.options.spawn.env_clear = true;
        self
    }

    pub fn build(self) -> ExecOptions {
        self.options
    }
}
