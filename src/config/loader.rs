// src/config/loader.rs

//! Reading `Rawexec.toml`.
//!
//! Parsing and validation are separate steps: [`load_from_path`] yields the
//! raw TOML model, [`load_and_validate`] turns it into a [`ConfigFile`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Rawexec.toml";

/// Parse the file at `path` without semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = contents.len(), "read config file");
    Ok(toml::from_str(&contents)?)
}

/// Parse and validate the file at `path`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// Like [`load_and_validate`], but a file that does not exist yields the
/// default config. Any other read failure is still reported.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(contents) => ConfigFile::try_from(toml::from_str::<RawConfigFile>(&contents)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(ConfigFile::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// [`DEFAULT_CONFIG_FILE`] relative to the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
