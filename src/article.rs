//! Producer side: from source articles to index tokens.
//!
//! Structural parsing of markup is delegated to an [`ArticleParser`]. This
//! module decides which articles are indexed at all and normalizes the parsed
//! fields into an [`IndexToken`]: word counting happens on the parsed plain
//! text, then title, keywords and content are stripped of accents.

use std::fmt::Debug;

use crate::document::IndexToken;
use crate::error::Result;
use crate::text::{count_words, remove_accents};

/// MIME type prefix of indexable articles.
pub const INDEXED_MIME_TYPE: &str = "text/html";

/// A source article as supplied by the container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Article {
    /// Single-character namespace (e.g. `A`).
    pub namespace: char,
    /// Url within the namespace.
    pub url: String,
    /// Title recorded in the container.
    pub title: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// Whether this entry only redirects to another article.
    pub redirect: bool,
    /// Raw content bytes.
    pub data: Vec<u8>,
}

impl Article {
    /// Create an HTML article.
    pub fn html<U, T, D>(namespace: char, url: U, title: T, data: D) -> Self
    where
        U: Into<String>,
        T: Into<String>,
        D: Into<Vec<u8>>,
    {
        Article {
            namespace,
            url: url.into(),
            title: title.into(),
            mime_type: INDEXED_MIME_TYPE.to_string(),
            redirect: false,
            data: data.into(),
        }
    }

    /// Namespace-qualified url, the document's unique identifier.
    pub fn full_url(&self) -> String {
        format!("{}/{}", self.namespace, self.url)
    }
}

/// What a structural parser extracted from an article.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedArticle {
    /// Plain text with markup removed.
    pub text: String,
    /// Title found in the markup, if any.
    pub title: Option<String>,
    /// Keywords found in the markup, space separated.
    pub keywords: Option<String>,
    /// The article asks not to be indexed.
    pub noindex: bool,
}

/// Extracts plain text and metadata from raw article bytes.
pub trait ArticleParser: Send + Sync + Debug {
    /// Parse `data` declared as `mime_type` in `encoding`.
    fn parse(&self, data: &[u8], mime_type: &str, encoding: &str) -> Result<ParsedArticle>;
}

/// Result of handing one article to the indexer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArticleOutcome {
    /// The article was queued for indexing.
    Queued,
    /// The parser failed; the article was queued with the recoverable fields.
    QueuedDegraded { reason: String },
    /// Redirect entries are not indexed.
    SkippedRedirect,
    /// The MIME type is not indexable.
    SkippedMimeType,
    /// The article carries a no-index marker.
    SkippedNoIndex,
}

impl ArticleOutcome {
    /// Whether a token was produced.
    pub fn is_queued(&self) -> bool {
        matches!(
            self,
            ArticleOutcome::Queued | ArticleOutcome::QueuedDegraded { .. }
        )
    }
}

/// Turn an article into a token, or explain why it is not indexed.
pub fn tokenize_article(
    article: &Article,
    parser: &dyn ArticleParser,
) -> (Option<IndexToken>, ArticleOutcome) {
    if article.redirect {
        return (None, ArticleOutcome::SkippedRedirect);
    }
    if !article.mime_type.starts_with(INDEXED_MIME_TYPE) {
        return (None, ArticleOutcome::SkippedMimeType);
    }

    let (parsed, outcome) = match parser.parse(&article.data, &article.mime_type, "UTF-8") {
        Ok(parsed) => (parsed, ArticleOutcome::Queued),
        Err(e) => {
            log::debug!("parsing {} failed: {e}", article.full_url());
            (
                ParsedArticle::default(),
                ArticleOutcome::QueuedDegraded {
                    reason: e.to_string(),
                },
            )
        }
    };

    if parsed.noindex {
        return (None, ArticleOutcome::SkippedNoIndex);
    }

    let accented_title = match parsed.title {
        Some(title) if !title.is_empty() => title,
        _ => article.title.clone(),
    };

    let token = IndexToken {
        url: article.full_url(),
        title: remove_accents(&accented_title),
        keywords: remove_accents(parsed.keywords.as_deref().unwrap_or_default()),
        word_count: count_words(&parsed.text).to_string(),
        content: remove_accents(&parsed.text),
        accented_title,
    };

    (Some(token), outcome)
}
