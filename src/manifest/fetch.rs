// src/manifest/fetch.rs

//! Manifest retrieval
//!
//! The manifest is fetched fresh for every command with a single HTTP
//! attempt. The raw bytes are also written to a scratch file for inspection;
//! that copy is never read back, so failing to write it only produces a
//! warning.

use super::Manifest;
use crate::config::Config;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Raw manifest text plus any non-fatal problem writing the scratch copy
#[derive(Debug, Clone)]
pub struct FetchedManifest {
    pub text: String,
    pub cache_error: Option<String>,
}

impl FetchedManifest {
    pub fn parse(&self) -> Manifest {
        Manifest::parse(&self.text)
    }
}

/// Anything that can produce the current manifest text
pub trait ManifestSource: Send + Sync {
    /// Retrieve the manifest
    fn fetch(&self) -> Result<FetchedManifest>;
}

/// Fetches the manifest over HTTP(S)
pub struct HttpManifestFetcher {
    client: Client,
    url: String,
    cache_file: PathBuf,
}

impl HttpManifestFetcher {
    /// Create a fetcher for the configured manifest URL
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.manifest_url.clone(),
            cache_file: config.cache_file.clone(),
        })
    }

    fn download(&self) -> Result<Vec<u8>> {
        info!("Fetching repository list from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| Error::Network(format!("Failed to fetch {}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| Error::Network(format!("Failed to read response: {}", e)))?;

        debug!("Downloaded repository list: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

impl ManifestSource for HttpManifestFetcher {
    fn fetch(&self) -> Result<FetchedManifest> {
        let bytes = self.download()?;

        let cache_error = match write_scratch_copy(&self.cache_file, &bytes) {
            Ok(()) => {
                debug!("Saved repository list to {}", self.cache_file.display());
                None
            }
            Err(e) => {
                warn!("{}", e);
                Some(e.to_string())
            }
        };

        Ok(FetchedManifest {
            text: decode_manifest(bytes),
            cache_error,
        })
    }
}

/// Decode the downloaded bytes; invalid UTF-8 only spoils the lines it is on
fn decode_manifest(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Repository list is not valid UTF-8: {}", e);
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Manifest held in memory, for offline use and tests
#[derive(Debug, Clone)]
pub struct StaticManifest(pub String);

impl ManifestSource for StaticManifest {
    fn fetch(&self) -> Result<FetchedManifest> {
        Ok(FetchedManifest {
            text: self.0.clone(),
            cache_error: None,
        })
    }
}

fn write_scratch_copy(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Error::IoError(format!("Failed to create directory {}: {}", parent.display(), e))
        })?;
    }
    fs::write(path, bytes).map_err(|e| {
        Error::IoError(format!(
            "Failed to save repository list to {}: {}",
            path.display(),
            e
        ))
    })
}

/// Result of clearing scratch files
#[derive(Debug, Default)]
pub struct ScratchCleanup {
    pub removed: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Delete scratch files; a failure on one file does not stop the others
pub fn remove_scratch_files(paths: &[PathBuf]) -> ScratchCleanup {
    let mut cleanup = ScratchCleanup::default();

    for path in paths {
        if !path.exists() {
            debug!("Scratch file {} not found, skipping", path.display());
            cleanup.missing.push(path.clone());
            continue;
        }
        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed scratch file {}", path.display());
                cleanup.removed.push(path.clone());
            }
            Err(e) => {
                warn!("Failed to remove scratch file {}: {}", path.display(), e);
                cleanup.failed.push((path.clone(), e.to_string()));
            }
        }
    }

    cleanup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_scratch_copy_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/repo-list.zcr");

        write_scratch_copy(&path, b"a -> b\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a -> b\n");
    }

    #[test]
    fn test_write_scratch_copy_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file cannot act as a parent directory
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let result = write_scratch_copy(&blocker.join("repo-list.zcr"), b"x");
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_static_manifest() {
        let source = StaticManifest("foo -> https://example.com/foo.git\n".to_string());
        let fetched = source.fetch().unwrap();
        assert!(fetched.cache_error.is_none());
        assert_eq!(fetched.parse().resolve("foo").unwrap(), "https://example.com/foo.git");
    }

    #[test]
    fn test_invalid_utf8_keeps_other_lines() {
        let mut bytes = b"foo -> https://example.com/foo.git\n".to_vec();
        bytes.extend_from_slice(b"b\xffd -> https://example.com/bad.git\n");
        bytes.extend_from_slice(b"bar -> https://example.com/bar.git\n");

        let manifest = Manifest::parse(&decode_manifest(bytes));
        assert_eq!(manifest.resolve("foo").unwrap(), "https://example.com/foo.git");
        assert_eq!(manifest.resolve("bar").unwrap(), "https://example.com/bar.git");
        assert!(manifest.resolve("bd").is_err());
    }

    #[test]
    fn test_remove_scratch_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("repo-list.zcr");
        let absent = dir.path().join("zcr.log");
        fs::write(&present, b"data").unwrap();

        let cleanup = remove_scratch_files(&[present.clone(), absent.clone()]);
        assert_eq!(cleanup.removed, vec![present.clone()]);
        assert_eq!(cleanup.missing, vec![absent]);
        assert!(cleanup.failed.is_empty());
        assert!(!present.exists());
    }

    #[test]
    fn test_unreachable_manifest_is_network_error() {
        let config = Config {
            // Port 9 (discard) on localhost is closed in test environments
            manifest_url: "http://127.0.0.1:9/repo-list.zcr".to_string(),
            cache_file: tempfile::tempdir().unwrap().path().join("repo-list.zcr"),
            ..Config::default()
        };
        let fetcher = HttpManifestFetcher::new(&config).unwrap();
        assert!(matches!(fetcher.fetch(), Err(Error::Network(_))));
    }
}
