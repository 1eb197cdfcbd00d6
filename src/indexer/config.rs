//! Indexer configuration.

use serde::{Deserialize, Serialize};

use crate::analysis::language::Language;
use crate::document::BoostConfig;
use crate::error::Result;
use crate::storage::StorageConfig;

/// Configuration for one index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Language tag of the corpus (ISO-639-3 or ISO-639-1).
    pub language: String,

    /// Locale used to recognise numeric literals.
    ///
    /// Defaults to the two-letter code derived from `language`.
    pub locale: Option<String>,

    /// Documents indexed between two automatic checkpoints; 0 disables them.
    pub flush_threshold: usize,

    /// Field weights.
    pub boosts: BoostConfig,

    /// Build-time store settings.
    pub storage: StorageConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            language: "eng".to_string(),
            locale: None,
            flush_threshold: 1000,
            boosts: BoostConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Default configuration for `language`.
    pub fn new<S: Into<String>>(language: S) -> Self {
        IndexerConfig {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Set the numeric locale.
    pub fn with_locale<S: Into<String>>(mut self, locale: S) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the automatic checkpoint interval.
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold;
        self
    }

    /// The parsed language tag.
    pub fn language(&self) -> Language {
        Language::new(&self.language)
    }

    /// The locale used for numeric literals.
    pub fn numeric_locale(&self) -> String {
        match &self.locale {
            Some(locale) => locale.clone(),
            None => self.language().code().to_string(),
        }
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
