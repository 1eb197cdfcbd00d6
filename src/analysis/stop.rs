//! Term filter: decides whether a term is noise.
//!
//! A term is noise when it is a complete numeric literal in the build locale
//! or when it appears in the language's stopword list. Either condition alone
//! is sufficient. Noise terms are removed from postings entirely.
//!
//! # Examples
//!
//! ```
//! use folio::analysis::NumberParser;
//! use folio::analysis::stop::TermFilter;
//!
//! let filter = TermFilter::from_words(vec!["the", "of"])
//!     .with_number_parser(NumberParser::for_locale("en").unwrap());
//!
//! assert!(filter.is_noise("the"));
//! assert!(filter.is_noise("1,000"));
//! assert!(!filter.is_noise("12abc"));
//! assert!(!filter.is_noise("quick"));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::language::Language;
use crate::analysis::number::NumberParser;
use crate::error::Result;
use crate::resource::ResourceProvider;

/// Stopword set plus an optional locale number parser.
///
/// Immutable once built; share it with `Arc` between threads.
#[derive(Clone, Debug)]
pub struct TermFilter {
    /// The set of stop words to remove
    stop_words: Arc<HashSet<String>>,
    /// The stopword resource exactly as loaded, recorded in index metadata
    source: Arc<str>,
    /// Numeric literal recogniser, absent when the locale has no number data
    numbers: Option<NumberParser>,
}

impl TermFilter {
    /// Load the filter for a build language.
    ///
    /// The stopword list is fetched from `stopwords/<language>`; a missing
    /// list is an error. Missing number format data for `locale` is not: the
    /// filter is then stopword-only and a warning is logged.
    pub fn load(
        language: &Language,
        locale: &str,
        resources: &dyn ResourceProvider,
    ) -> Result<Self> {
        let source = resources.get_resource(&language.stopwords_key())?;
        let filter = Self::from_source(&source);

        match NumberParser::for_locale(locale) {
            Ok(parser) => Ok(filter.with_number_parser(parser)),
            Err(e) => {
                log::warn!("{e}; numbers will not be skipped from indexing");
                Ok(filter)
            }
        }
    }

    /// Build a filter from a newline-delimited stopword list.
    pub fn from_source(source: &str) -> Self {
        let stop_words = source
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();

        TermFilter {
            stop_words: Arc::new(stop_words),
            source: Arc::from(source),
            numbers: None,
        }
    }

    /// Build a filter from a list of stop words.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self::from_source(&words.join("\n"))
    }

    /// Attach a number parser.
    pub fn with_number_parser(mut self, parser: NumberParser) -> Self {
        self.numbers = Some(parser);
        self
    }

    /// Returns `true` if `term` must not be indexed.
    pub fn is_noise(&self, term: &str) -> bool {
        if let Some(numbers) = &self.numbers {
            if numbers.is_number(term) {
                return true;
            }
        }
        self.is_stop_word(term)
    }

    /// Check if a word is a stop word.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Whether numeric literals are being detected.
    pub fn detects_numbers(&self) -> bool {
        self.numbers.is_some()
    }

    /// The raw stopword list this filter was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Get the number of stop words.
    pub fn len(&self) -> usize {
        self.stop_words.len()
    }

    /// Check if the stop word set is empty.
    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FolioError;
    use crate::resource::MemoryResources;

    fn english() -> TermFilter {
        TermFilter::from_words(vec!["the", "and", "or"])
            .with_number_parser(NumberParser::for_locale("en").unwrap())
    }

    #[test]
    fn test_stop_words_are_noise() {
        let filter = english();

        assert!(filter.is_noise("the"));
        assert!(filter.is_noise("and"));
        assert!(!filter.is_noise("hello"));
    }

    #[test]
    fn test_numbers_are_noise() {
        let filter = english();

        assert!(filter.is_noise("1000"));
        assert!(filter.is_noise("1,000"));
        assert!(filter.is_noise("3.5"));
        assert!(!filter.is_noise("12abc"));
        assert!(!filter.is_noise("a1"));
    }

    #[test]
    fn test_stop_word_wins_without_number_parser() {
        let filter = TermFilter::from_words(vec!["42", "the"]);

        assert!(!filter.detects_numbers());
        assert!(filter.is_noise("42"));
        assert!(!filter.is_noise("43"));
    }

    #[test]
    fn test_source_is_parsed_line_by_line() {
        let filter = TermFilter::from_source("le\r\nla\n\n  les  \n");

        assert_eq!(filter.len(), 3);
        assert!(filter.is_stop_word("les"));
        assert_eq!(filter.source(), "le\r\nla\n\n  les  \n");
    }

    #[test]
    fn test_load_without_locale_data() {
        let resources = MemoryResources::new().with("stopwords/zzz", "foo\nbar");
        let filter = TermFilter::load(&Language::new("zzz"), "zzz", &resources).unwrap();

        assert!(!filter.detects_numbers());
        assert!(filter.is_noise("foo"));
        assert!(!filter.is_noise("1000"));
    }

    #[test]
    fn test_load_requires_stopwords() {
        let resources = MemoryResources::new();
        let result = TermFilter::load(&Language::new("eng"), "en", &resources);

        assert!(matches!(result, Err(FolioError::Resource(_))));
    }
}
