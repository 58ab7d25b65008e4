// src/git.rs

//! Repository driver
//!
//! Thin wrapper over the handful of git operations the lifecycle needs, each
//! scoped to a single working directory. The [`Vcs`] trait is the seam the
//! lifecycle manager depends on; [`GitCli`] implements it by invoking the
//! `git` binary.

use crate::error::{Error, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

/// Upstream commits missing from a local clone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCommits {
    /// Exact number of commits behind the upstream tracking reference
    Count(u64),
    /// No upstream tracking reference is configured
    Unknown,
}

impl PendingCommits {
    /// Unknown counts as stale; reporting zero would hide drift
    pub fn needs_update(&self) -> bool {
        !matches!(self, PendingCommits::Count(0))
    }
}

/// Version-control operations against one working directory
pub trait Vcs: Send + Sync {
    /// Clone `url` into `dest`, which must be absent or empty
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Update remote-tracking refs without touching the working tree
    fn fetch(&self, dest: &Path) -> Result<()>;

    /// Commits on the upstream tracking reference not yet merged locally
    fn pending_commit_count(&self, dest: &Path) -> Result<PendingCommits>;

    /// Fast-forward the checked out branch to its upstream
    fn pull(&self, dest: &Path) -> Result<()>;
}

/// [`Vcs`] backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use a specific git executable
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command<I, S>(&self, dir: Option<&Path>, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    fn output(&self, mut cmd: Command) -> Result<Output> {
        debug!("Running {:?}", cmd);
        cmd.output().map_err(|e| {
            Error::Git(format!(
                "Failed to run {}: {}",
                self.program.display(),
                e
            ))
        })
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        if url.trim().is_empty() || url.chars().any(char::is_whitespace) {
            return Err(Error::Clone(format!("Invalid repository URL '{}'", url)));
        }
        if !is_empty_or_missing(dest)? {
            return Err(Error::Clone(format!(
                "Destination {} already exists and is not empty",
                dest.display()
            )));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::IoError(format!("Failed to create directory {}: {}", parent.display(), e))
            })?;
        }

        info!("Cloning {} into {}", url, dest.display());
        let mut cmd = self.command(None, ["clone", "--quiet", "--"]);
        cmd.arg(url).arg(dest);

        let output = self
            .output(cmd)
            .map_err(|e| Error::Clone(e.to_string()))?;
        if !output.status.success() {
            return Err(Error::Clone(format!(
                "git clone {} exited with {}: {}",
                url,
                output.status,
                stderr_of(&output)
            )));
        }
        Ok(())
    }

    fn fetch(&self, dest: &Path) -> Result<()> {
        ensure_repository(dest)?;

        debug!("Fetching upstream for {}", dest.display());
        let output = self.output(self.command(Some(dest), ["fetch", "--quiet"]))?;
        if !output.status.success() {
            return Err(Error::Network(format!(
                "git fetch in {} failed: {}",
                dest.display(),
                stderr_of(&output)
            )));
        }
        Ok(())
    }

    fn pending_commit_count(&self, dest: &Path) -> Result<PendingCommits> {
        ensure_repository(dest)?;

        let upstream = self.output(self.command(
            Some(dest),
            ["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
        ))?;
        if !upstream.status.success() {
            debug!(
                "No upstream tracking reference in {}: {}",
                dest.display(),
                stderr_of(&upstream)
            );
            return Ok(PendingCommits::Unknown);
        }
        let upstream = String::from_utf8_lossy(&upstream.stdout).trim().to_string();

        let range = format!("HEAD..{}", upstream);
        let output = self.output(self.command(Some(dest), ["rev-list", "--count", range.as_str()]))?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git rev-list {} in {} failed: {}",
                range,
                dest.display(),
                stderr_of(&output)
            )));
        }

        let count = parse_count(&String::from_utf8_lossy(&output.stdout))?;
        debug!("{} is {} commit(s) behind {}", dest.display(), count, upstream);
        Ok(PendingCommits::Count(count))
    }

    fn pull(&self, dest: &Path) -> Result<()> {
        ensure_repository(dest)?;

        info!("Fast-forwarding {}", dest.display());
        let output = self.output(self.command(Some(dest), ["merge", "--ff-only", "--quiet", "@{u}"]))?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git merge --ff-only in {} failed: {}",
                dest.display(),
                stderr_of(&output)
            )));
        }
        Ok(())
    }
}

fn ensure_repository(dest: &Path) -> Result<()> {
    if dest.join(".git").exists() {
        Ok(())
    } else {
        Err(Error::NotARepository(dest.to_path_buf()))
    }
}

fn is_empty_or_missing(dest: &Path) -> Result<bool> {
    match fs::read_dir(dest) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotADirectory => Ok(false),
        Err(e) => Err(Error::IoError(format!(
            "Failed to inspect {}: {}",
            dest.display(),
            e
        ))),
    }
}

fn parse_count(stdout: &str) -> Result<u64> {
    let trimmed = stdout.trim();
    trimmed
        .parse::<u64>()
        .map_err(|_| Error::Git(format!("Invalid commit count '{}'", trimmed)))
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_git() -> GitCli {
        GitCli::with_program("/nonexistent/zcr-test/git")
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("3\n").unwrap(), 3);
        assert_eq!(parse_count("0").unwrap(), 0);
        assert!(parse_count("three").is_err());
        assert!(parse_count("").is_err());
    }

    #[test]
    fn test_needs_update() {
        assert!(!PendingCommits::Count(0).needs_update());
        assert!(PendingCommits::Count(2).needs_update());
        assert!(PendingCommits::Unknown.needs_update());
    }

    #[test]
    fn test_clone_into_non_empty_dir_fails_before_running_git() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("existing"), b"x").unwrap();

        // The git binary does not exist, so reaching it would give a different message
        let err = missing_git()
            .clone_repo("https://example.com/pkg.git", dir.path())
            .unwrap_err();
        match err {
            Error::Clone(msg) => assert!(msg.contains("not empty")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_clone_rejects_invalid_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = missing_git()
            .clone_repo("not a url", &dir.path().join("pkg"))
            .unwrap_err();
        assert!(matches!(err, Error::Clone(_)));
    }

    #[test]
    fn test_clone_with_missing_git_is_clone_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = missing_git()
            .clone_repo("https://example.com/pkg.git", &dir.path().join("pkg"))
            .unwrap_err();
        assert!(matches!(err, Error::Clone(_)));
    }

    #[test]
    fn test_operations_on_plain_directory_are_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let git = missing_git();

        assert!(matches!(git.fetch(dir.path()), Err(Error::NotARepository(_))));
        assert!(matches!(
            git.pending_commit_count(dir.path()),
            Err(Error::NotARepository(_))
        ));
        assert!(matches!(git.pull(dir.path()), Err(Error::NotARepository(_))));
    }
}
