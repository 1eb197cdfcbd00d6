//! Language tags.
//!
//! A build is configured with a single language tag, either an ISO-639-3 code
//! (`eng`, `fra`) or an ISO-639-1 code (`en`, `fr`). The tag itself is what is
//! recorded in the index metadata and used to find the stopword resource; the
//! derived two-letter code selects the stemmer and the numeric locale.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ISO-639-3 to ISO-639-1 mapping for the languages commonly found in
/// article corpora.
const ISO_639_3_TO_1: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("ben", "bn"),
    ("bul", "bg"),
    ("cat", "ca"),
    ("ces", "cs"),
    ("dan", "da"),
    ("deu", "de"),
    ("ell", "el"),
    ("eng", "en"),
    ("est", "et"),
    ("eus", "eu"),
    ("fas", "fa"),
    ("fin", "fi"),
    ("fra", "fr"),
    ("gle", "ga"),
    ("glg", "gl"),
    ("heb", "he"),
    ("hin", "hi"),
    ("hrv", "hr"),
    ("hun", "hu"),
    ("hye", "hy"),
    ("ind", "id"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("lav", "lv"),
    ("lit", "lt"),
    ("nld", "nl"),
    ("nob", "nb"),
    ("nor", "no"),
    ("pol", "pl"),
    ("por", "pt"),
    ("ron", "ro"),
    ("rus", "ru"),
    ("slk", "sk"),
    ("slv", "sl"),
    ("spa", "es"),
    ("srp", "sr"),
    ("swe", "sv"),
    ("tam", "ta"),
    ("tha", "th"),
    ("tur", "tr"),
    ("ukr", "uk"),
    ("vie", "vi"),
    ("zho", "zh"),
];

/// A language tag as configured for one index build.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Language {
    tag: String,
    code: String,
}

impl Language {
    /// Create a language from a configured tag, kept verbatim.
    pub fn new<S: AsRef<str>>(tag: S) -> Self {
        let tag = tag.as_ref().to_string();
        let code = derive_code(&tag);
        Language { tag, code }
    }

    /// The tag exactly as it is recorded in the index metadata.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The two-letter code used for stemming and number formats.
    ///
    /// Region subtags (`en-US`, `pt_BR`) are dropped and the code is
    /// lower-cased. Unknown three-letter codes are returned as-is.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Logical resource key of this language's stopword list.
    pub fn stopwords_key(&self) -> String {
        format!("stopwords/{}", self.tag)
    }
}

fn derive_code(tag: &str) -> String {
    let primary = tag
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    ISO_639_3_TO_1
        .iter()
        .find(|(iso3, _)| *iso3 == primary)
        .map(|(_, iso1)| iso1.to_string())
        .unwrap_or(primary)
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Language::new(tag)
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Language::new(tag)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.tag
    }
}
