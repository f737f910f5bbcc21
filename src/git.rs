// src/git.rs

//! Git version check.
//!
//! Runs `git --version` through an [`Executor`] and compares the reported
//! version against a configured minimum. Any failure (git missing, non-zero
//! exit, unparsable output) counts as "not satisfied".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::exec::Executor;
use crate::types::ExecOptions;

/// Oldest git release known to work.
pub const DEFAULT_MIN_GIT_VERSION: GitVersion = GitVersion {
    major: 2,
    minor: 33,
    patch: 0,
};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for GitVersion {
    type Err = String;

    /// Extracts the first `major.minor[.patch]` found in `s`, so both
    /// `"2.39.1"` and `"git version 2.39.1.windows.1"` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| format!("no version number found in {s:?}"))?;

        let part = |idx: usize| -> Result<u64, String> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|e| format!("invalid version component '{}': {e}", m.as_str())),
                None => Ok(0),
            }
        };

        Ok(GitVersion {
            major: part(1)?,
            minor: part(2)?,
            patch: part(3)?,
        })
    }
}

/// Returns true if the installed git is at least `min`.
pub async fn validate_git_version<E: Executor + ?Sized>(executor: &E, min: GitVersion) -> bool {
    let output = match executor.exec("git --version", ExecOptions::default()).await {
        Ok(output) => output,
        Err(err) => {
            warn!(error = %err, "unable to run git; is it installed?");
            return false;
        }
    };

    let found = match output.stdout.parse::<GitVersion>() {
        Ok(version) => version,
        Err(e) => {
            warn!(stdout = %output.stdout.trim(), error = %e, "could not parse git version");
            return false;
        }
    };

    if found < min {
        warn!(%found, %min, "git version is too old");
        return false;
    }

    debug!(%found, %min, "git version ok");
    info!(version = %found, "found git");
    true
}
