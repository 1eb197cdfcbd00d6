//! Term generation: text in, weighted terms out.
//!
//! The generator tokenizes text, drops every noise term (stop-all semantics)
//! and stems each survivor when a stemmer is configured (stem-all semantics).
//! Only term frequencies are accumulated; positions are never recorded.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::analysis::stem::{LanguageStemmer, StemStrategy};
use crate::analysis::stop::TermFilter;
use crate::analysis::tokenizer::UnicodeWordTokenizer;

/// Within-document frequencies keyed by term.
pub type TermFrequencies = BTreeMap<String, u32>;

/// Turns text into index terms for one language.
#[derive(Debug)]
pub struct TermGenerator {
    tokenizer: UnicodeWordTokenizer,
    filter: Arc<TermFilter>,
    stemmer: Option<LanguageStemmer>,
}

impl TermGenerator {
    /// Create a generator. Stemming is enabled iff a stemmer is given.
    pub fn new(filter: Arc<TermFilter>, stemmer: Option<LanguageStemmer>) -> Self {
        TermGenerator {
            tokenizer: UnicodeWordTokenizer::new(),
            filter,
            stemmer,
        }
    }

    /// The stemming strategy in effect.
    pub fn stem_strategy(&self) -> StemStrategy {
        if self.stemmer.is_some() {
            StemStrategy::All
        } else {
            StemStrategy::None
        }
    }

    /// The term filter in use.
    pub fn filter(&self) -> &TermFilter {
        &self.filter
    }

    /// Index `text`, adding `wdf_inc` to the frequency of every term occurrence.
    pub fn index_text(&self, text: &str, wdf_inc: u32, terms: &mut TermFrequencies) {
        for word in self.tokenizer.tokenize(text) {
            if self.filter.is_noise(&word) {
                continue;
            }
            let term = match &self.stemmer {
                Some(stemmer) => stemmer.stem(&word),
                None => word,
            };
            if term.is_empty() {
                continue;
            }
            let wdf = terms.entry(term).or_insert(0);
            *wdf = wdf.saturating_add(wdf_inc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::number::NumberParser;

    fn generator(stem: bool) -> TermGenerator {
        let filter = TermFilter::from_words(vec!["the", "of"])
            .with_number_parser(NumberParser::for_locale("en").unwrap());
        let stemmer = if stem {
            LanguageStemmer::for_language("en")
        } else {
            None
        };
        TermGenerator::new(Arc::new(filter), stemmer)
    }

    #[test]
    fn test_stop_all_and_stem_all() {
        let generator = generator(true);
        let mut terms = TermFrequencies::new();
        generator.index_text("The running of 1000 dogs, running", 1, &mut terms);

        assert_eq!(generator.stem_strategy(), StemStrategy::All);
        assert_eq!(terms.get("run"), Some(&2));
        assert_eq!(terms.get("dog"), Some(&1));
        assert!(!terms.contains_key("the"));
        assert!(!terms.contains_key("1000"));
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_wdf_increment_accumulates() {
        let generator = generator(false);
        let mut terms = TermFrequencies::new();
        generator.index_text("quick fox", 3, &mut terms);
        generator.index_text("quick", 1, &mut terms);

        assert_eq!(generator.stem_strategy(), StemStrategy::None);
        assert_eq!(terms.get("quick"), Some(&4));
        assert_eq!(terms.get("fox"), Some(&3));
    }

    #[test]
    fn test_wdf_saturates_instead_of_overflowing() {
        let generator = generator(false);
        let mut terms = TermFrequencies::new();
        generator.index_text("beacon beacon beacon", u32::MAX / 2, &mut terms);

        assert_eq!(terms.get("beacon"), Some(&u32::MAX));
    }
}
