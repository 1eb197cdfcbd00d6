//! Plain-text helpers used when turning an article into an index token.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use unicode_segmentation::UnicodeSegmentation;

/// Remove diacritics, leaving the text otherwise unchanged.
///
/// The text is decomposed (NFD), combining marks are dropped, and the result
/// is recomposed (NFC).
pub fn remove_accents(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect()
}

/// Count the words of a plain text.
pub fn count_words(text: &str) -> usize {
    text.unicode_words().count()
}
