//! The persistent index.
//!
//! While an index is being built it lives in a store directory at
//! `<path>.tmp`: a metadata file plus one file per committed transaction.
//! Finalizing compacts that store into a single immutable file at `<path>`,
//! which [`IndexReader`](reader::IndexReader) opens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

pub mod compact;
pub mod reader;
pub mod transaction;
pub mod writer;

/// Metadata key of the value-slot map.
pub const VALUES_MAP_KEY: &str = "valuesmap";

/// Metadata key of the language tag.
pub const LANGUAGE_KEY: &str = "language";

/// Metadata key of the stopword list.
pub const STOPWORDS_KEY: &str = "stopwords";

/// Document identifier inside one index, assigned in insertion order from 0.
pub type DocId = u32;

/// Store-wide metadata recorded when a build begins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    entries: BTreeMap<String, String>,
}

impl StoreMetadata {
    /// Metadata for a build in `language` filtered with `stopwords`.
    pub fn new(language: &str, stopwords: &str) -> Self {
        let mut metadata = StoreMetadata::default();
        metadata.set(VALUES_MAP_KEY, crate::document::VALUES_MAP);
        metadata.set(LANGUAGE_KEY, language);
        metadata.set(STOPWORDS_KEY, stopwords);
        metadata
    }

    /// Set a metadata entry.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.entries.insert(key.into(), value.into());
    }

    /// Get a metadata entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the value-slot map (`title:0;wordcount:1`).
    pub fn value_slots(&self) -> Result<BTreeMap<String, u32>> {
        let raw = self
            .get(VALUES_MAP_KEY)
            .ok_or_else(|| FolioError::not_found("value slot map"))?;
        parse_value_slots(raw)
    }
}

/// Parse a `name:slot;name:slot` value-slot map.
pub fn parse_value_slots(raw: &str) -> Result<BTreeMap<String, u32>> {
    raw.split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, slot) = entry
                .split_once(':')
                .ok_or_else(|| FolioError::corruption(format!("bad value slot entry '{entry}'")))?;
            let slot = slot
                .parse::<u32>()
                .map_err(|e| FolioError::corruption(format!("bad value slot '{entry}': {e}")))?;
            Ok((name.to_string(), slot))
        })
        .collect()
}
