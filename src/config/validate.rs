// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RawexecError, Result};
use crate::git::GitVersion;
use crate::types::ShellOption;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RawexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_exec_section(&raw)?;
        let min_git_version = parse_min_git_version(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.exec, min_git_version))
    }
}

fn validate_exec_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.exec.max_buffer == Some(0) {
        return Err(RawexecError::ConfigError(
            "[exec].max_buffer must be >= 1 (got 0)".to_string(),
        ));
    }

    if let ShellOption::Path(ref path) = cfg.exec.shell {
        if path.as_os_str().is_empty() {
            return Err(RawexecError::ConfigError(
                "[exec].shell must be a boolean or a non-empty path".to_string(),
            ));
        }
    }

    for key in cfg.exec.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(RawexecError::ConfigError(format!(
                "[exec.env] has invalid variable name '{}'",
                key
            )));
        }
    }

    Ok(())
}

fn parse_min_git_version(cfg: &RawConfigFile) -> Result<Option<GitVersion>> {
    match cfg.git.min_version {
        Some(ref s) => s.parse::<GitVersion>().map(Some).map_err(|e| {
            RawexecError::ConfigError(format!("[git].min_version is invalid: {e}"))
        }),
        None => Ok(None),
    }
}
