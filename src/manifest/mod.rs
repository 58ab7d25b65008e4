// src/manifest/mod.rs

//! Package manifest parsing and lookup
//!
//! The manifest is a plain UTF-8 document with one `<name> -> <url>` pair per
//! line. Blank lines and lines whose first non-whitespace character is `#`
//! are ignored. Lines that do not split into exactly two non-empty parts on
//! the literal separator are skipped so one bad line cannot hide the rest of
//! the repository list.
//!
//! Duplicate names resolve last-wins.

pub mod fetch;

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

pub use fetch::{HttpManifestFetcher, ManifestSource};

/// Separator between package name and repository URL
pub const SEPARATOR: &str = " -> ";

/// One resolved package entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    pub url: String,
}

/// Parsed manifest with last-wins name resolution
///
/// Entries keep the order in which each name first appeared in the document.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

impl Manifest {
    /// Parse manifest text
    pub fn parse(text: &str) -> Self {
        let mut manifest = Manifest::default();
        let mut skipped = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some((name, url)) => manifest.insert(name, url),
                None => {
                    skipped += 1;
                    debug!("Skipping malformed manifest line: {}", line);
                }
            }
        }

        debug!(
            "Parsed manifest: {} packages, {} malformed lines skipped",
            manifest.len(),
            skipped
        );
        manifest
    }

    fn insert(&mut self, name: &str, url: &str) {
        match self.index.get(name) {
            Some(&pos) => self.entries[pos].url = url.to_string(),
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(ManifestEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                });
            }
        }
    }

    /// Repository URL for an exact, case-sensitive package name
    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.index
            .get(name)
            .map(|&pos| self.entries[pos].url.as_str())
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))
    }

    /// Case-insensitive substring search over package names
    ///
    /// No match is an empty result, not an error.
    pub fn find(&self, query: &str) -> Vec<ManifestEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name to URL mapping
    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.url.clone()))
            .collect()
    }
}

/// Split a significant line into `(name, url)`
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(SEPARATOR);
    let name = parts.next()?.trim();
    let url = parts.next()?.trim();
    if parts.next().is_some() || name.is_empty() || url.is_empty() {
        return None;
    }
    Some((name, url))
}

/// Parse manifest text into a name to URL mapping
pub fn parse(text: &str) -> HashMap<String, String> {
    Manifest::parse(text).to_map()
}

/// Resolve a single package name in manifest text
pub fn lookup(text: &str, name: &str) -> Result<String> {
    Manifest::parse(text).resolve(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Zenit community repository list
hello -> https://example.com/hello.git

  world ->   https://example.com/world.git
# bar -> https://example.com/bar.git
broken line without separator
a -> b -> c
HelloTool -> https://example.com/hellotool.git
";

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        let map = parse(SAMPLE);
        assert_eq!(map.len(), 3);
        assert_eq!(map["hello"], "https://example.com/hello.git");
        assert_eq!(map["world"], "https://example.com/world.git");
        assert!(!map.contains_key("bar"));
        assert!(!map.contains_key("a"));
    }

    #[test]
    fn test_indented_comment_is_ignored() {
        let map = parse("   # hidden -> https://example.com/x.git\nx -> y\n");
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key("# hidden"));
    }

    #[test]
    fn test_empty_sides_are_malformed() {
        let map = parse(" -> https://example.com/x.git\nname -> \nok -> url\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["ok"], "url");
    }

    #[test]
    fn test_lookup_matches_parse() {
        let map = parse(SAMPLE);
        for (name, url) in &map {
            assert_eq!(&lookup(SAMPLE, name).unwrap(), url);
        }
    }

    #[test]
    fn test_lookup_missing_is_package_not_found() {
        let err = lookup(SAMPLE, "bar").unwrap_err();
        assert!(matches!(err, Error::PackageNotFound(name) if name == "bar"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(lookup(SAMPLE, "HELLO").is_err());
        assert!(lookup(SAMPLE, "hello").is_ok());
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let text = "dup -> https://first.example/dup.git\ndup -> https://second.example/dup.git\n";
        let manifest = Manifest::parse(text);
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.resolve("dup").unwrap(), "https://second.example/dup.git");
        assert_eq!(lookup(text, "dup").unwrap(), "https://second.example/dup.git");
    }

    #[test]
    fn test_find_is_case_insensitive_substring() {
        let manifest = Manifest::parse(SAMPLE);
        let names: Vec<_> = manifest
            .find("hello")
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["hello", "HelloTool"]);
    }

    #[test]
    fn test_find_ignores_commented_entries() {
        let text = "foo -> https://example.com/foo.git\n# bar -> https://example.com/bar.git\n";
        let manifest = Manifest::parse(text);

        assert!(manifest.find("bar").is_empty());

        let found = manifest.find("foo");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://example.com/foo.git");
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::parse("\n\n# nothing here\n");
        assert!(manifest.is_empty());
        assert!(manifest.find("").is_empty());
    }
}
