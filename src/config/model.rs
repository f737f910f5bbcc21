// src/config/model.rs

use serde::Deserialize;

use crate::git::GitVersion;
use crate::types::ExecOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [exec]
/// max_buffer = 10485760
/// shell = "/bin/bash"
/// cwd = "."
///
/// [exec.env]
/// LANG = "C"
///
/// [git]
/// min_version = "2.33.0"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Default options for every execution, from `[exec]`.
    #[serde(default)]
    pub exec: ExecOptions,

    #[serde(default)]
    pub git: GitSection,
}

/// `[git]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitSection {
    /// Minimum accepted git version; `None` uses the built-in minimum.
    #[serde(default)]
    pub min_version: Option<String>,
}

/// Validated configuration.
///
/// Constructed only through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `Default`, so holders can rely on the invariants checked there.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub exec: ExecOptions,
    /// Parsed `[git].min_version`, if configured.
    pub min_git_version: Option<GitVersion>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(exec: ExecOptions, min_git_version: Option<GitVersion>) -> Self {
        Self {
            exec,
            min_git_version,
        }
    }
}
