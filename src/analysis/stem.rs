//! Per-language stemming.
//!
//! Stemming is backed by the Snowball algorithms of `rust-stemmers`. A build
//! either stems every surviving term ([`StemStrategy::All`]) or, when no
//! algorithm exists for its language, stems nothing ([`StemStrategy::None`]).

use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};

/// Whether terms are stemmed before indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StemStrategy {
    /// Index terms exactly as tokenized.
    None,
    /// Stem every term before indexing.
    All,
}

/// A Snowball stemmer bound to one language.
pub struct LanguageStemmer {
    code: String,
    stemmer: Stemmer,
}

impl std::fmt::Debug for LanguageStemmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageStemmer")
            .field("code", &self.code)
            .field("stemmer", &"<stemmer>")
            .finish()
    }
}

impl LanguageStemmer {
    /// Create the stemmer for a two-letter language code, if one exists.
    pub fn for_language(code: &str) -> Option<Self> {
        let algorithm = algorithm_for(code)?;
        Some(LanguageStemmer {
            code: code.to_string(),
            stemmer: Stemmer::create(algorithm),
        })
    }

    /// The language code this stemmer was created for.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Stem a word to its root form.
    pub fn stem(&self, word: &str) -> String {
        self.stemmer.stem(word).into_owned()
    }
}

fn algorithm_for(code: &str) -> Option<Algorithm> {
    let algorithm = match code {
        "ar" => Algorithm::Arabic,
        "da" => Algorithm::Danish,
        "nl" => Algorithm::Dutch,
        "en" => Algorithm::English,
        "fi" => Algorithm::Finnish,
        "fr" => Algorithm::French,
        "de" => Algorithm::German,
        "el" => Algorithm::Greek,
        "hu" => Algorithm::Hungarian,
        "it" => Algorithm::Italian,
        "no" | "nb" | "nn" => Algorithm::Norwegian,
        "pt" => Algorithm::Portuguese,
        "ro" => Algorithm::Romanian,
        "ru" => Algorithm::Russian,
        "es" => Algorithm::Spanish,
        "sv" => Algorithm::Swedish,
        "ta" => Algorithm::Tamil,
        "tr" => Algorithm::Turkish,
        _ => return None,
    };
    Some(algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_stemmer() {
        let stemmer = LanguageStemmer::for_language("en").unwrap();

        assert_eq!(stemmer.stem("running"), "run");
        assert_eq!(stemmer.stem("flies"), "fli");
        assert_eq!(stemmer.code(), "en");
    }

    #[test]
    fn test_french_stemmer() {
        let stemmer = LanguageStemmer::for_language("fr").unwrap();

        let stemmed = stemmer.stem("continuellement");
        assert!(stemmed.len() < "continuellement".len());
        assert!("continuellement".starts_with(&stemmed));
    }

    #[test]
    fn test_unsupported_language() {
        assert!(LanguageStemmer::for_language("ja").is_none());
        assert!(LanguageStemmer::for_language("").is_none());
    }
}
