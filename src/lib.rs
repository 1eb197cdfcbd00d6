//! # Folio
//!
//! Builds persistent full-text indexes over large, mostly static article
//! corpora.
//!
//! ## Features
//!
//! - Locale-aware term filtering (stopwords and numeric literals)
//! - Per-language stemming with graceful fallback
//! - Weighted multi-field documents (title, keywords, content)
//! - Transactional, crash-bounded writes with periodic checkpoints
//! - Compaction into a single immutable, portable index file
//! - An asynchronous single-writer indexing pipeline with a blocking
//!   completion handle for pull-based consumers

pub mod analysis;
pub mod article;
pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod resource;
pub mod storage;
pub mod text;
pub mod util;

pub mod prelude {
    pub use crate::article::{Article, ArticleOutcome, ArticleParser, ParsedArticle};
    pub use crate::document::{BoostConfig, DocumentBuilder, IndexDocument, IndexToken};
    pub use crate::error::{FolioError, Result};
    pub use crate::index::reader::IndexReader;
    pub use crate::index::writer::IndexWriter;
    pub use crate::indexer::{Degradation, IndexBlob, Indexer, IndexerConfig};
    pub use crate::resource::{MemoryResources, ResourceProvider};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
