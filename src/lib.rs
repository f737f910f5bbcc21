// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod git;
pub mod logging;
pub mod types;

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::exec::{Executor, RealExecutor};
use crate::git::DEFAULT_MIN_GIT_VERSION;
use crate::types::{ExecOptions, ShellOption};

pub use crate::errors::{ExecError, ExecErrorKind};
pub use crate::exec::execute;
pub use crate::types::ExecResult;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file defaults, then CLI overrides)
/// - the optional git version check
/// - a single execution of the requested command
///
/// Returns the exit status the process should terminate with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(&args)?;
    let options = resolve_options(&cfg, &args);
    let command = args.command_line();

    if args.dry_run {
        print_dry_run(&command, &options);
        return Ok(0);
    }

    let executor = RealExecutor;

    if args.check_git {
        let min = cfg.min_git_version.unwrap_or(DEFAULT_MIN_GIT_VERSION);
        if !git::validate_git_version(&executor, min).await {
            error!(%min, "git version check failed");
            return Ok(1);
        }
    }

    run_command(&executor, &command, options).await
}

/// Execute `command` and mirror its captured output onto our own streams.
pub async fn run_command<E: Executor + ?Sized>(
    executor: &E,
    command: &str,
    options: ExecOptions,
) -> Result<i32> {
    match executor.exec(command, options).await {
        Ok(output) => {
            print!("{}", output.stdout);
            eprint!("{}", output.stderr);
            info!(command, "command succeeded");
            Ok(0)
        }
        Err(err) => {
            print!("{}", err.stdout);
            eprint!("{}", err.stderr);
            error!(
                command,
                kind = ?err.kind,
                exit_code = ?err.exit_code,
                signal = ?err.signal,
                error = %err.message,
                "command failed"
            );
            Ok(err.exit_status_hint())
        }
    }
}

fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let cfg = match args.config {
        Some(ref path) => config::load_and_validate(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => config::load_or_default(config::default_config_path())
            .context("loading default config")?,
    };
    debug!(?cfg, "loaded config");
    Ok(cfg)
}

/// Config file values, overridden by whatever was given on the command line.
fn resolve_options(cfg: &ConfigFile, args: &CliArgs) -> ExecOptions {
    let mut options = cfg.exec.clone();

    if let Some(max_buffer) = args.max_buffer {
        options.max_buffer = Some(max_buffer);
    }
    if let Some(ref shell) = args.shell {
        options.shell = ShellOption::Path(shell.clone());
    }
    if let Some(ref cwd) = args.cwd {
        options.cwd = Some(cwd.clone());
    }
    for (key, value) in &args.env {
        options.env.insert(key.clone(), value.clone());
    }

    options
}

/// Simple dry-run output: print the command and the resolved options.
fn print_dry_run(command: &str, options: &ExecOptions) {
    println!("rawexec dry-run");
    println!("  command: {command}");
    println!("  shell: {}", options.shell);
    println!("  max_buffer: {}", options.resolved_max_buffer());
    if let Some(ref cwd) = options.cwd {
        println!("  cwd: {}", cwd.display());
    }
    if !options.env.is_empty() {
        println!("  env:");
        for (key, value) in &options.env {
            println!("    {key}={value}");
        }
    }
    if options.spawn.env_clear {
        println!("  env_clear: true");
    }

    debug!("dry-run complete (no execution)");
}
