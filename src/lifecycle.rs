// src/lifecycle.rs

//! Package lifecycle manager
//!
//! Drives install, update, upgrade, remove and find by combining the
//! manifest source, the repository driver, the hook runner and the registry.
//!
//! # State machine
//!
//! ```text
//! install:  Absent -> Resolving -> Cloning -> Unpacking -> Present
//! update:   Present -> Fetching -> UpToDate
//!                              \-> Pulling -> Unpacking -> Present
//! remove:   Present -> PreRemoveHook -> Deleting -> Absent
//! ```
//!
//! Nothing records a partial install. If cloning or unpacking fails the
//! directory is left as it is, and the next install of that name fails with
//! `AlreadyExists` until the package is removed.
//!
//! Every public operation reports its stages to a [`ProgressSink`] and closes
//! the sequence with exactly one terminal event.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{GitCli, PendingCommits, Vcs};
use crate::hooks::{HookExecutor, HookKind, HookOutcome, HookRunner, ShellHookExecutor};
use crate::manifest::{HttpManifestFetcher, Manifest, ManifestEntry, ManifestSource};
use crate::progress::{ProgressSink, Stage};
use crate::registry::Registry;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Package label for events that are not about a single package
pub const BATCH: &str = "*";

/// A request the lifecycle manager can carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Install(String),
    Update(String),
    Upgrade,
    Remove(String),
    Find(String),
    Refresh,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install(name) => write!(f, "install {}", name),
            Operation::Update(name) => write!(f, "update {}", name),
            Operation::Upgrade => f.write_str("upgrade"),
            Operation::Remove(name) => write!(f, "remove {}", name),
            Operation::Find(query) => write!(f, "find {}", query),
            Operation::Refresh => f.write_str("refresh"),
        }
    }
}

/// Aggregate result of upgrading every installed package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpgradeSummary {
    pub attempted: usize,
    pub updated: usize,
    pub up_to_date: usize,
    /// `(package, error message)` for each package that failed
    pub failures: Vec<(String, String)>,
}

impl UpgradeSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Successful result of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed { name: String },
    Updated { name: String },
    UpToDate { name: String },
    Removed { name: String },
    /// Remove of a package that was not installed
    NotPresent { name: String },
    Upgraded(UpgradeSummary),
    Found(Vec<ManifestEntry>),
    Refreshed { packages: usize },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Installed { name } => write!(f, "Package {} installed successfully", name),
            Outcome::Updated { name } => write!(f, "Package {} updated successfully", name),
            Outcome::UpToDate { name } => write!(f, "Package {} is already up to date", name),
            Outcome::Removed { name } => write!(f, "Package {} removed successfully", name),
            Outcome::NotPresent { name } => {
                write!(f, "Package {} is not installed, nothing to remove", name)
            }
            Outcome::Upgraded(summary) => write!(
                f,
                "Upgrade finished: {} attempted, {} updated, {} up to date, {} failed",
                summary.attempted,
                summary.updated,
                summary.up_to_date,
                summary.failed()
            ),
            Outcome::Found(entries) if entries.is_empty() => f.write_str("No packages found"),
            Outcome::Found(entries) => write!(f, "Found {} package(s)", entries.len()),
            Outcome::Refreshed { packages } => {
                write!(f, "Repository list refreshed ({} packages)", packages)
            }
        }
    }
}

/// Orchestrates package lifecycle operations
pub struct PackageManager {
    registry: Registry,
    manifest: Box<dyn ManifestSource>,
    vcs: Box<dyn Vcs>,
    hooks: HookRunner,
}

impl PackageManager {
    /// Create a manager from explicit collaborators
    pub fn new(
        config: Config,
        manifest: Box<dyn ManifestSource>,
        vcs: Box<dyn Vcs>,
        hook_executor: Box<dyn HookExecutor>,
    ) -> Self {
        let registry = Registry::new(config.root);
        let hooks = HookRunner::new(hook_executor, config.build_dir);
        Self {
            registry,
            manifest,
            vcs,
            hooks,
        }
    }

    /// Manager using HTTP, the git binary and `/bin/sh` hooks
    pub fn with_defaults(config: Config) -> Result<Self> {
        let fetcher = HttpManifestFetcher::new(&config)?;
        Ok(Self::new(
            config,
            Box::new(fetcher),
            Box::new(GitCli::new()),
            Box::new(ShellHookExecutor::new()),
        ))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatch an [`Operation`]
    pub fn run(&self, operation: &Operation, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        match operation {
            Operation::Install(name) => self.install(name, sink),
            Operation::Update(name) => self.update(name, sink),
            Operation::Upgrade => self.upgrade(sink),
            Operation::Remove(name) => self.remove(name, sink),
            Operation::Find(query) => self.find(query, sink),
            Operation::Refresh => self.refresh(sink),
        }
    }

    /// Clone a package from the manifest and run its unpack hook
    pub fn install(&self, name: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let result = self.install_package(name, sink);
        finish(sink, result)
    }

    /// Bring one installed package up to date with its upstream
    pub fn update(&self, name: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let mut manifest = None;
        let result = self.update_package(name, &mut manifest, sink);
        finish(sink, result)
    }

    /// Update every installed package, one after another
    ///
    /// A failing package is recorded in the summary and does not stop the
    /// rest. Only a failed manifest fetch fails the whole upgrade.
    pub fn upgrade(&self, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let result = self.upgrade_all(sink);
        finish(sink, result)
    }

    /// Run the remove hook and delete the package directory
    pub fn remove(&self, name: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let result = self.remove_package(name, sink);
        finish(sink, result)
    }

    /// Search the manifest for package names containing `query`
    pub fn find(&self, query: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let result = self
            .load_manifest(BATCH, sink)
            .map(|manifest| Outcome::Found(manifest.find(query)));
        finish(sink, result)
    }

    /// Download the manifest and report how many packages it lists
    pub fn refresh(&self, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        let result = self
            .load_manifest(BATCH, sink)
            .map(|manifest| Outcome::Refreshed {
                packages: manifest.len(),
            });
        finish(sink, result)
    }

    fn load_manifest(&self, package: &str, sink: &mut dyn ProgressSink) -> Result<Manifest> {
        sink.stage(package, Stage::FetchingManifest);
        let fetched = self.manifest.fetch()?;
        if let Some(cache_error) = &fetched.cache_error {
            sink.warn(package, cache_error);
        }
        Ok(fetched.parse())
    }

    fn install_package(&self, name: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        info!("Installing package {}", name);

        // Checked before anything touches the network or the disk
        let dir = self.registry.package_dir(name)?;
        if dir.exists() {
            return Err(Error::AlreadyExists {
                name: name.to_string(),
                path: dir,
            });
        }

        let manifest = self.load_manifest(name, sink)?;
        let url = manifest.resolve(name)?;
        info!("Found package {} at {}", name, url);

        self.registry.ensure_root()?;
        let _lock = self.registry.lock(name)?;
        if dir.exists() {
            return Err(Error::AlreadyExists {
                name: name.to_string(),
                path: dir,
            });
        }

        self.clone_and_unpack(name, url, &dir, sink)?;

        info!("Package {} installed", name);
        Ok(Outcome::Installed {
            name: name.to_string(),
        })
    }

    fn clone_and_unpack(
        &self,
        name: &str,
        url: &str,
        dir: &Path,
        sink: &mut dyn ProgressSink,
    ) -> Result<()> {
        sink.stage(name, Stage::Cloning);
        self.vcs.clone_repo(url, dir)?;

        self.unpack(name, dir, sink)
    }

    fn unpack(&self, name: &str, dir: &Path, sink: &mut dyn ProgressSink) -> Result<()> {
        sink.stage(name, Stage::RunningHook(HookKind::Unpack));
        match self.hooks.run(HookKind::Unpack, dir)? {
            HookOutcome::Ran => debug!("unpack.sh finished for {}", name),
            HookOutcome::Skipped => info!(
                "No unpack.sh for {}, package left in {}",
                name,
                dir.display()
            ),
        }
        Ok(())
    }

    /// Remove hook failures never block deleting the directory
    fn pre_remove_hook(&self, name: &str, dir: &Path, sink: &mut dyn ProgressSink) {
        sink.stage(name, Stage::RunningHook(HookKind::Remove));
        match self.hooks.run(HookKind::Remove, dir) {
            Ok(HookOutcome::Ran) => debug!("remove.sh finished for {}", name),
            Ok(HookOutcome::Skipped) => debug!("No remove.sh for {}", name),
            Err(e) => {
                warn!("Ignoring remove hook failure for {}: {}", name, e);
                sink.warn(name, &e.to_string());
            }
        }
    }

    fn update_package(
        &self,
        name: &str,
        manifest: &mut Option<Manifest>,
        sink: &mut dyn ProgressSink,
    ) -> Result<Outcome> {
        info!("Updating package {}", name);

        if !self.registry.is_installed(name)? {
            return Err(Error::NotInstalled(name.to_string()));
        }
        let dir = self.registry.package_dir(name)?;
        let _lock = self.registry.lock(name)?;

        sink.stage(name, Stage::CheckingUpdates);
        self.vcs.fetch(&dir)?;
        let pending = self.vcs.pending_commit_count(&dir)?;
        if !pending.needs_update() {
            info!("Package {} is up to date", name);
            return Ok(Outcome::UpToDate {
                name: name.to_string(),
            });
        }

        match pending {
            PendingCommits::Count(count) => {
                info!("{} upstream commit(s) for {}", count, name);
                sink.stage(name, Stage::Pulling);
                self.vcs.pull(&dir)?;
                self.unpack(name, &dir, sink)?;
                Ok(Outcome::Updated {
                    name: name.to_string(),
                })
            }
            PendingCommits::Unknown => {
                info!("No tracked branch for {}, reinstalling from scratch", name);
                self.reinstall(name, &dir, manifest, sink)?;
                Ok(Outcome::Updated {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Full re-clone for packages whose clone has no upstream to compare against
    fn reinstall(
        &self,
        name: &str,
        dir: &Path,
        manifest: &mut Option<Manifest>,
        sink: &mut dyn ProgressSink,
    ) -> Result<()> {
        let loaded = match manifest.take() {
            Some(loaded) => loaded,
            None => self.load_manifest(name, sink)?,
        };
        let url = manifest.insert(loaded).resolve(name)?.to_string();

        self.pre_remove_hook(name, dir, sink);
        sink.stage(name, Stage::Removing);
        self.registry.delete_package(name)?;

        self.clone_and_unpack(name, &url, dir, sink)
    }

    fn upgrade_all(&self, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        info!("Upgrading all packages");

        let mut manifest = Some(self.load_manifest(BATCH, sink)?);
        let installed = self.registry.installed()?;
        let mut summary = UpgradeSummary::default();

        for name in installed {
            summary.attempted += 1;
            match self.update_package(&name, &mut manifest, sink) {
                Ok(Outcome::UpToDate { .. }) => summary.up_to_date += 1,
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    warn!("Failed to update {}: {}", name, e);
                    sink.warn(&name, &e.to_string());
                    summary.failures.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Upgrade complete: {} attempted, {} failed",
            summary.attempted,
            summary.failed()
        );
        Ok(Outcome::Upgraded(summary))
    }

    fn remove_package(&self, name: &str, sink: &mut dyn ProgressSink) -> Result<Outcome> {
        info!("Removing package {}", name);

        let dir = self.registry.package_dir(name)?;
        if !dir.exists() {
            info!("Package {} is not installed, nothing to remove", name);
            return Ok(Outcome::NotPresent {
                name: name.to_string(),
            });
        }
        let _lock = self.registry.lock(name)?;

        self.pre_remove_hook(name, &dir, sink);

        sink.stage(name, Stage::Removing);
        self.registry.delete_package(name)?;

        info!("Package {} removed", name);
        Ok(Outcome::Removed {
            name: name.to_string(),
        })
    }
}

fn finish(sink: &mut dyn ProgressSink, result: Result<Outcome>) -> Result<Outcome> {
    if let Err(e) = &result {
        warn!("Operation failed: {}", e);
    }
    sink.finish(&result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_messages() {
        let installed = Outcome::Installed {
            name: "hello".to_string(),
        };
        assert_eq!(installed.to_string(), "Package hello installed successfully");

        let summary = UpgradeSummary {
            attempted: 3,
            updated: 1,
            up_to_date: 1,
            failures: vec![("b".to_string(), "boom".to_string())],
        };
        assert_eq!(
            Outcome::Upgraded(summary).to_string(),
            "Upgrade finished: 3 attempted, 1 updated, 1 up to date, 1 failed"
        );
        assert_eq!(Outcome::Found(Vec::new()).to_string(), "No packages found");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Install("x".to_string()).to_string(), "install x");
        assert_eq!(Operation::Upgrade.to_string(), "upgrade");
    }
}
