// src/config.rs

//! Runtime configuration
//!
//! zcr has no configuration file. The binary fills a [`Config`] from command
//! line flags and environment variables; everything else falls back to the
//! defaults below.

use std::path::PathBuf;
use std::time::Duration;

/// Default location of the package manifest
pub const DEFAULT_MANIFEST_URL: &str =
    "https://raw.githubusercontent.com/Zenit-Linux/zcr/main/library/repo-list.zcr";

/// Default registry root holding one directory per installed package
pub const DEFAULT_ROOT: &str = "/usr/lib/zcr";

/// Default scratch copy of the last fetched manifest
pub const DEFAULT_CACHE_FILE: &str = "/tmp/repo-list.zcr";

/// Default log file
pub const DEFAULT_LOG_FILE: &str = "/tmp/zcr.log";

/// Subdirectory of a package holding `unpack.sh` / `remove.sh`
pub const BUILD_FILES_DIR: &str = "zcr-build-files";

/// Timeout for the manifest download (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by every lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub manifest_url: String,
    pub root: PathBuf,
    pub cache_file: PathBuf,
    pub log_file: PathBuf,
    pub build_dir: String,
    pub http_timeout: Duration,
}

impl Config {
    /// Configuration rooted at an alternative registry directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Files `autoremove` is allowed to delete
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        vec![self.cache_file.clone(), self.log_file.clone()]
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            root: PathBuf::from(DEFAULT_ROOT),
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            build_dir: BUILD_FILES_DIR.to_string(),
            http_timeout: HTTP_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.root, PathBuf::from("/usr/lib/zcr"));
        assert_eq!(config.build_dir, "zcr-build-files");
        assert!(config.manifest_url.ends_with("repo-list.zcr"));
    }

    #[test]
    fn test_with_root_keeps_other_defaults() {
        let config = Config::with_root("/opt/zcr");
        assert_eq!(config.root, PathBuf::from("/opt/zcr"));
        assert_eq!(config.cache_file, PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(
            config.scratch_files(),
            vec![
                PathBuf::from(DEFAULT_CACHE_FILE),
                PathBuf::from(DEFAULT_LOG_FILE)
            ]
        );
    }
}
