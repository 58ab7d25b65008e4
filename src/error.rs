// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for zcr
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest or repository transport failure (never retried)
    #[error("Network error: {0}")]
    Network(String),

    /// Manifest has no entry with this exact name
    #[error("Package '{0}' not found in the repository list")]
    PackageNotFound(String),

    /// Install target already has a registry directory
    #[error("Package '{name}' is already installed at {}", .path.display())]
    AlreadyExists { name: String, path: PathBuf },

    /// Name cannot be used as a registry directory
    #[error("Invalid package name '{0}'")]
    InvalidPackageName(String),

    /// Update target has no registry directory
    #[error("Package '{0}' is not installed")]
    NotInstalled(String),

    /// Clone could not produce a working copy
    #[error("Clone failed: {0}")]
    Clone(String),

    /// Directory is not a git working copy
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// Any other git invocation failure (pull, rev-list, ...)
    #[error("Git error: {0}")]
    Git(String),

    /// Lifecycle hook exited unsuccessfully
    #[error("Hook {} failed: {status}", .script.display())]
    Hook { script: PathBuf, status: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O errors with context
    #[error("I/O error: {0}")]
    IoError(String),

    /// Another process holds the package lock
    #[error("Package '{0}' is locked by another zcr process")]
    Locked(String),
}

/// Result type alias using zcr's Error type
pub type Result<T> = std::result::Result<T, Error>;
