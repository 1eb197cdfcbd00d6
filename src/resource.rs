//! Resource providers.
//!
//! Linguistic data such as stopword lists is looked up by logical key
//! (`stopwords/<language>`). Where the data lives is up to the provider: an
//! in-memory table, a directory on disk, or the small set bundled with the
//! crate.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

use crate::error::{FolioError, Result};

/// Default English stop words, bundled under `stopwords/eng` and `stopwords/en`.
const BUNDLED_ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Supplies text resources by logical key.
pub trait ResourceProvider: Send + Sync + Debug {
    /// Fetch the resource stored under `key`.
    ///
    /// Returns [`FolioError::Resource`] when the key is unknown.
    fn get_resource(&self, key: &str) -> Result<String>;
}

/// Resources held in memory. Mostly useful for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, String>,
}

impl MemoryResources {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }
}

impl ResourceProvider for MemoryResources {
    fn get_resource(&self, key: &str) -> Result<String> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| FolioError::resource(format!("unknown resource '{key}'")))
    }
}

/// Resources read from files below a root directory; the key is the
/// relative path (`<root>/stopwords/eng`).
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    /// Create a provider rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        DirectoryResources {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ResourceProvider for DirectoryResources {
    fn get_resource(&self, key: &str) -> Result<String> {
        if key.split('/').any(|part| part == "..") {
            return Err(FolioError::resource(format!("invalid resource key '{key}'")));
        }

        let path = self.root.join(key);
        std::fs::read_to_string(&path).map_err(|e| {
            FolioError::resource(format!(
                "cannot read resource '{key}' from {}: {e}",
                path.display()
            ))
        })
    }
}

/// The resources compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

impl ResourceProvider for BundledResources {
    fn get_resource(&self, key: &str) -> Result<String> {
        match key {
            "stopwords/eng" | "stopwords/en" => Ok(BUNDLED_ENGLISH_STOP_WORDS.join("\n")),
            _ => Err(FolioError::resource(format!("unknown resource '{key}'"))),
        }
    }
}
