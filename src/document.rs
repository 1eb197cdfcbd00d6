//! Index tokens and documents.
//!
//! An [`IndexToken`] is the normalized record a producer derives from one
//! article. The [`DocumentBuilder`] turns it into an [`IndexDocument`]: the url
//! becomes the opaque payload, the accented title and word count go into the
//! fixed value slots, and title, keywords and content are indexed into one
//! weighted term set.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::term_generator::{TermFrequencies, TermGenerator};

/// Value slot holding the display title.
pub const TITLE_SLOT: u32 = 0;

/// Value slot holding the word count.
pub const WORD_COUNT_SLOT: u32 = 1;

/// Store-wide description of the value slots, recorded in index metadata.
pub const VALUES_MAP: &str = "title:0;wordcount:1";

/// The normalized record derived from one article and queued for indexing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexToken {
    /// Namespace-qualified unique identifier, e.g. `A/Paris`.
    pub url: String,
    /// Accent-stripped title, used for indexing.
    pub title: String,
    /// Title with diacritics, used for display.
    pub accented_title: String,
    /// Accent-stripped keywords.
    pub keywords: String,
    /// Accent-stripped plain text content.
    pub content: String,
    /// Decimal word count of the plain text.
    pub word_count: String,
}

impl IndexToken {
    /// Create a token with only a url; fill the other fields directly.
    pub fn new<S: Into<String>>(url: S) -> Self {
        IndexToken {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Field weights applied while building a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Content length (in bytes) worth one extra point of title boost.
    pub title_length_divisor: usize,
    /// Weight of keyword terms.
    pub keywords_boost: u32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        BoostConfig {
            title_length_divisor: 500,
            keywords_boost: 3,
        }
    }
}

impl BoostConfig {
    /// Title weight for an article with `content_len` bytes of content.
    ///
    /// Never decreases as content grows; short articles get weight 1.
    pub fn title_boost(&self, content_len: usize) -> u32 {
        let divisor = self.title_length_divisor.max(1);
        u32::try_from(content_len / divisor)
            .unwrap_or(u32::MAX - 1)
            .saturating_add(1)
    }

    /// Weight of content terms.
    pub fn content_boost(&self) -> u32 {
        1
    }
}

/// The unit persisted in the index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Opaque data returned verbatim on lookup (the article url).
    pub payload: String,
    /// Stored, non-indexed values by slot.
    pub values: BTreeMap<u32, String>,
    /// Within-document frequency of every indexed term.
    pub terms: TermFrequencies,
}

impl IndexDocument {
    /// Value stored in `slot`, if any.
    pub fn value(&self, slot: u32) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }

    /// The display title.
    pub fn title(&self) -> &str {
        self.value(TITLE_SLOT).unwrap_or_default()
    }

    /// The word count as stored.
    pub fn word_count(&self) -> &str {
        self.value(WORD_COUNT_SLOT).unwrap_or_default()
    }

    /// Within-document frequency of `term` (0 when absent).
    pub fn wdf(&self, term: &str) -> u32 {
        self.terms.get(term).copied().unwrap_or(0)
    }
}

/// Builds weighted documents from index tokens.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    generator: Arc<TermGenerator>,
    boosts: BoostConfig,
}

impl DocumentBuilder {
    /// Create a builder.
    pub fn new(generator: Arc<TermGenerator>, boosts: BoostConfig) -> Self {
        DocumentBuilder { generator, boosts }
    }

    /// The term generator in use.
    pub fn generator(&self) -> &TermGenerator {
        &self.generator
    }

    /// Build the document for `token`.
    ///
    /// Slot 0 receives the accented title, slot 1 the word count. Empty
    /// fields contribute no terms.
    pub fn build(&self, token: &IndexToken) -> IndexDocument {
        let mut document = IndexDocument {
            payload: token.url.clone(),
            ..Default::default()
        };
        document
            .values
            .insert(TITLE_SLOT, token.accented_title.clone());
        document
            .values
            .insert(WORD_COUNT_SLOT, token.word_count.clone());

        if !token.title.is_empty() {
            let boost = self.boosts.title_boost(token.content.len());
            self.generator
                .index_text(&token.title, boost, &mut document.terms);
        }

        if !token.keywords.is_empty() {
            self.generator.index_text(
                &token.keywords,
                self.boosts.keywords_boost,
                &mut document.terms,
            );
        }

        if !token.content.is_empty() {
            self.generator.index_text(
                &token.content,
                self.boosts.content_boost(),
                &mut document.terms,
            );
        }

        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stop::TermFilter;

    fn builder() -> DocumentBuilder {
        let filter = TermFilter::from_words(vec!["the"]);
        let generator = TermGenerator::new(Arc::new(filter), None);
        DocumentBuilder::new(Arc::new(generator), BoostConfig::default())
    }

    #[test]
    fn test_title_boost_grows_with_content() {
        let boosts = BoostConfig::default();

        assert_eq!(boosts.title_boost(0), 1);
        assert_eq!(boosts.title_boost(499), 1);
        assert_eq!(boosts.title_boost(500), 2);
        assert_eq!(boosts.title_boost(10_000), 21);
        assert!(boosts.title_boost(usize::MAX) >= boosts.title_boost(10_000));
    }

    #[test]
    fn test_fields_are_weighted() {
        let token = IndexToken {
            url: "A/Fox".to_string(),
            title: "Fox".to_string(),
            accented_title: "Fox".to_string(),
            keywords: "animal".to_string(),
            content: "the fox is an animal".to_string(),
            word_count: "5".to_string(),
        };
        let document = builder().build(&token);

        assert_eq!(document.payload, "A/Fox");
        assert_eq!(document.title(), "Fox");
        assert_eq!(document.word_count(), "5");
        // title boost 1 + content 1
        assert_eq!(document.wdf("fox"), 2);
        // keywords boost 3 + content 1
        assert_eq!(document.wdf("animal"), 4);
        assert_eq!(document.wdf("the"), 0);
    }

    #[test]
    fn test_empty_title_has_no_title_postings() {
        let token = IndexToken {
            url: "A/Untitled".to_string(),
            content: "body text".to_string(),
            word_count: "2".to_string(),
            ..Default::default()
        };
        let document = builder().build(&token);

        assert_eq!(document.title(), "");
        assert_eq!(document.values.len(), 2);
        assert_eq!(document.wdf("body"), 1);
        assert_eq!(document.wdf("text"), 1);
        assert_eq!(document.terms.len(), 2);
    }

    #[test]
    fn test_empty_token_has_no_terms() {
        let document = builder().build(&IndexToken::new("A/Empty"));

        assert!(document.terms.is_empty());
        assert_eq!(document.payload, "A/Empty");
    }
}
