// src/lib.rs

//! zcr - Zenit Community Repository package manager
//!
//! Resolves package names to git repositories through a centrally hosted
//! manifest and manages their install/update/remove lifecycle.
//!
//! # Architecture
//!
//! - Manifest-driven: a plain `name -> url` list, fetched fresh per command
//! - Directory-as-registry: a package is installed iff its directory exists
//! - Hooks: optional `unpack.sh` / `remove.sh` shipped by each package
//! - Progress events: ordered stages plus one terminal event per operation

pub mod config;
mod error;
pub mod git;
pub mod hooks;
pub mod lifecycle;
pub mod manifest;
pub mod progress;
pub mod registry;
pub mod theme;
pub mod ui;

pub use config::Config;
pub use error::{Error, Result};
pub use lifecycle::{Operation, Outcome, PackageManager, UpgradeSummary};
