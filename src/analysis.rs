//! Text analysis for Folio.
//!
//! This module turns raw article text into index terms: words are split on
//! Unicode boundaries and lower-cased, noise terms (stopwords and numeric
//! literals) are dropped, and the survivors are stemmed when the build
//! language has a stemmer.

pub mod language;
pub mod number;
pub mod stem;
pub mod stop;
pub mod term_generator;
pub mod tokenizer;

pub use language::Language;
pub use number::NumberParser;
pub use stem::{LanguageStemmer, StemStrategy};
pub use stop::TermFilter;
pub use term_generator::TermGenerator;
pub use tokenizer::UnicodeWordTokenizer;
