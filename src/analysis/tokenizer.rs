//! Unicode word tokenizer.
//!
//! Splits text using Unicode word boundary rules (UAX #29) and lower-cases
//! every word. Punctuation and whitespace segments are dropped. Numbers keep
//! their internal separators (`1,000` and `3.14` stay single words), which is
//! what lets the numeric-literal filter see the whole literal.
//!
//! # Examples
//!
//! ```
//! use folio::analysis::tokenizer::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let words: Vec<String> = tokenizer.tokenize("Hello, World! 1,000 cafés").collect();
//! assert_eq!(words, vec!["hello", "world", "1,000", "cafés"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

/// A tokenizer that splits text on Unicode word boundaries.
#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    /// Create a new Unicode word tokenizer.
    pub fn new() -> Self {
        UnicodeWordTokenizer
    }

    /// Iterate over the lower-cased words of `text`.
    pub fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split_word_bounds()
            .filter(|word| word.chars().any(|c| c.is_alphanumeric()))
            .map(|word| word.to_lowercase())
    }

    /// Get the name of this tokenizer.
    pub fn name(&self) -> &'static str {
        "unicode_word"
    }
}
