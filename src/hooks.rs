// src/hooks.rs

//! Lifecycle hook execution
//!
//! A package may ship `unpack.sh` and `remove.sh` in its build-files
//! directory. Both are optional: a missing script is reported as skipped.
//! Scripts run through `/bin/sh` with the build-files directory as working
//! directory, and their output goes straight to the terminal.
//!
//! Locating and executing scripts sit behind [`HookExecutor`] so a different
//! backend (sandboxed runner, test double) can be swapped in without touching
//! the lifecycle manager. Whether a failure is fatal is the caller's policy.

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Interpreter used for hook scripts
pub const DEFAULT_INTERPRETER: &str = "/bin/sh";

/// Lifecycle point a hook runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// After clone or pull
    Unpack,
    /// Before the package directory is deleted
    Remove,
}

impl HookKind {
    pub fn script_name(&self) -> &'static str {
        match self {
            HookKind::Unpack => "unpack.sh",
            HookKind::Remove => "remove.sh",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

/// Exit status of a hook process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl HookStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for HookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// What running a hook amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    Ran,
    Skipped,
}

/// Backend that finds and runs hook scripts
pub trait HookExecutor: Send + Sync {
    /// Path of the `kind` script inside `build_dir`, if the package ships one
    fn locate(&self, kind: HookKind, build_dir: &Path) -> Option<PathBuf>;

    /// Run `script` with `cwd` as working directory
    fn execute(&self, script: &Path, cwd: &Path) -> Result<HookStatus>;
}

/// Runs hooks as native `/bin/sh` processes
#[derive(Debug, Clone)]
pub struct ShellHookExecutor {
    interpreter: PathBuf,
}

impl ShellHookExecutor {
    pub fn new() -> Self {
        Self {
            interpreter: PathBuf::from(DEFAULT_INTERPRETER),
        }
    }
}

impl Default for ShellHookExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HookExecutor for ShellHookExecutor {
    fn locate(&self, kind: HookKind, build_dir: &Path) -> Option<PathBuf> {
        let script = build_dir.join(kind.script_name());
        script.is_file().then_some(script)
    }

    fn execute(&self, script: &Path, cwd: &Path) -> Result<HookStatus> {
        make_executable(script)?;

        debug!(
            "Executing {} {} in {}",
            self.interpreter.display(),
            script.display(),
            cwd.display()
        );

        let status = Command::new(&self.interpreter)
            .arg(script)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| {
                Error::IoError(format!("Failed to spawn {}: {}", script.display(), e))
            })?;

        Ok(HookStatus {
            code: status.code(),
        })
    }
}

/// Set the executable bits on a script, keeping its other permissions
fn make_executable(script: &Path) -> Result<()> {
    let metadata = fs::metadata(script).map_err(|e| {
        Error::IoError(format!("Failed to stat {}: {}", script.display(), e))
    })?;
    let mut permissions = metadata.permissions();
    let mode = permissions.mode();
    if mode & 0o111 != 0o111 {
        permissions.set_mode(mode | 0o755);
        fs::set_permissions(script, permissions).map_err(|e| {
            Error::IoError(format!(
                "Failed to make {} executable: {}",
                script.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Resolves and runs a package's hooks
pub struct HookRunner {
    executor: Box<dyn HookExecutor>,
    build_dir: String,
}

impl HookRunner {
    pub fn new(executor: Box<dyn HookExecutor>, build_dir: impl Into<String>) -> Self {
        Self {
            executor,
            build_dir: build_dir.into(),
        }
    }

    /// Run the `kind` hook of the package in `package_dir`
    ///
    /// A missing script is [`HookOutcome::Skipped`]; a non-zero exit is
    /// [`Error::Hook`].
    pub fn run(&self, kind: HookKind, package_dir: &Path) -> Result<HookOutcome> {
        let build_dir = package_dir.join(&self.build_dir);
        let Some(script) = self.executor.locate(kind, &build_dir) else {
            debug!("No {} in {}", kind, build_dir.display());
            return Ok(HookOutcome::Skipped);
        };

        info!("Running {}", script.display());
        let status = self.executor.execute(&script, &build_dir)?;
        if !status.success() {
            return Err(Error::Hook {
                script,
                status: status.to_string(),
            });
        }

        Ok(HookOutcome::Ran)
    }
}
