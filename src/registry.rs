// src/registry.rs

//! Installed-package registry
//!
//! The registry is nothing more than a root directory with one subdirectory
//! per installed package. Presence of that directory is the only record of
//! an installation; there is no separate index to keep in sync.
//!
//! Operations on a package hold an advisory `flock` on
//! `<root>/.locks/<name>.lock` so two zcr processes cannot work on the same
//! package directory at once.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory under the root holding lock files
pub const LOCK_DIR: &str = ".locks";

/// On-disk collection of installed packages
#[derive(Debug, Clone)]
pub struct Registry {
    root: PathBuf,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of package `name`, after checking the name is a plain path component
    pub fn package_dir(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    pub fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.package_dir(name)?.is_dir())
    }

    /// Installed package names, sorted
    ///
    /// A missing root means nothing is installed. Hidden entries and plain
    /// files are not packages.
    pub fn installed(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to read registry {}: {}",
                    self.root.display(),
                    e
                )));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 registry entry {:?}", entry.file_name());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Create the root directory if needed
    pub fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::IoError(format!(
                "Failed to create registry {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Recursively delete a package directory
    pub fn delete_package(&self, name: &str) -> Result<()> {
        let dir = self.package_dir(name)?;
        fs::remove_dir_all(&dir).map_err(|e| {
            Error::IoError(format!("Failed to remove {}: {}", dir.display(), e))
        })?;
        info!("Deleted {}", dir.display());
        Ok(())
    }

    /// Take the exclusive lock for `name` without blocking
    pub fn lock(&self, name: &str) -> Result<PackageLock> {
        validate_name(name)?;

        let lock_dir = self.root.join(LOCK_DIR);
        fs::create_dir_all(&lock_dir).map_err(|e| {
            Error::IoError(format!("Failed to create {}: {}", lock_dir.display(), e))
        })?;

        let path = lock_dir.join(format!("{}.lock", name));
        let file = File::create(&path).map_err(|e| {
            Error::IoError(format!("Failed to open lock {}: {}", path.display(), e))
        })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired package lock {}", path.display());
                Ok(PackageLock { file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(Error::Locked(name.to_string()))
            }
            Err(e) => Err(Error::IoError(format!(
                "Failed to lock {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Exclusive lock on one package, released on drop
#[derive(Debug)]
pub struct PackageLock {
    /// Kept open to hold the flock
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl PackageLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PackageLock {
    fn drop(&mut self) {
        debug!("Released package lock {}", self.path.display());
    }
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidPackageName(name.to_string()))
    }
}
