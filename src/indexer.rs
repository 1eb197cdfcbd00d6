//! The indexing pipeline.
//!
//! An [`Indexer`] is the build context of one index: the term filter and
//! stemmer chosen for the build language, the queue, and the worker thread
//! that owns the [`IndexWriter`]. Producers call [`Indexer::submit`] or
//! [`Indexer::handle_article`] from any thread; the finished index is
//! obtained through [`Indexer::finish`] or the [`IndexBlob`].
//!
//! # Example
//!
//! ```no_run
//! use folio::prelude::*;
//! use folio::resource::BundledResources;
//!
//! # fn main() -> folio::error::Result<()> {
//! let indexer = Indexer::start("wiki.idx", IndexerConfig::new("eng"), &BundledResources)?;
//!
//! let mut token = IndexToken::new("A/Paris");
//! token.title = "Paris".to_string();
//! token.accented_title = "Paris".to_string();
//! token.content = "paris is the capital of france".to_string();
//! token.word_count = "6".to_string();
//! indexer.submit(token)?;
//!
//! let bytes = indexer.blob().data()?;
//! assert!(!bytes.is_empty());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::analysis::language::Language;
use crate::analysis::stem::LanguageStemmer;
use crate::analysis::stop::TermFilter;
use crate::analysis::term_generator::TermGenerator;
use crate::article::{Article, ArticleOutcome, ArticleParser, tokenize_article};
use crate::document::{DocumentBuilder, IndexToken};
use crate::error::Result;
use crate::index::StoreMetadata;
use crate::index::writer::{FinalizeReport, IndexWriter};
use crate::resource::ResourceProvider;

pub mod blob;
pub mod config;
pub mod queue;
pub mod worker;

pub use blob::IndexBlob;
pub use config::IndexerConfig;
pub use queue::{IndexQueue, QueueItem};
pub use worker::WorkerOutcome;

/// A linguistic feature the build runs without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// No number format data for the locale: numeric literals are indexed.
    NumberParsingUnavailable { locale: String },
    /// No stemmer for the language: terms are indexed unstemmed.
    StemmingUnavailable { language: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::NumberParsingUnavailable { locale } => {
                write!(f, "no number format data for locale '{locale}'")
            }
            Degradation::StemmingUnavailable { language } => {
                write!(f, "no stemmer for language '{language}'")
            }
        }
    }
}

/// Counters of one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerStats {
    /// Tokens accepted into the queue.
    pub submitted: u64,
    /// Documents added to the index.
    pub indexed: u64,
    /// Articles not indexed (redirects, other MIME types, no-index).
    pub skipped: u64,
    /// Articles queued after a parse failure.
    pub degraded: u64,
    /// Tokens dropped because the build had already failed.
    pub discarded: u64,
    /// Transactions committed.
    pub commits: u64,
}

/// State shared between producers, the worker and the blob.
#[derive(Debug)]
pub(crate) struct BuildShared {
    pub(crate) queue: IndexQueue,
    pub(crate) outcome: Mutex<WorkerOutcome>,
    pub(crate) stats: Mutex<IndexerStats>,
}

impl BuildShared {
    fn new() -> Self {
        BuildShared {
            queue: IndexQueue::new(),
            outcome: Mutex::new(WorkerOutcome::Running),
            stats: Mutex::new(IndexerStats::default()),
        }
    }

    pub(crate) fn record_indexed(&self, commits: u64) {
        let mut stats = self.stats.lock();
        stats.indexed += 1;
        stats.commits = commits;
    }
}

/// The build context of one index.
#[derive(Debug)]
pub struct Indexer {
    config: IndexerConfig,
    language: Language,
    degradations: Vec<Degradation>,
    shared: Arc<BuildShared>,
    blob: Arc<IndexBlob>,
    worker: Option<JoinHandle<()>>,
}

impl Indexer {
    /// Start building the index that will live at `path`.
    ///
    /// Fails if the stopword list for the language cannot be loaded or the
    /// build store cannot be created. Missing number data or a missing
    /// stemmer only degrade the build; see [`Indexer::degradations`].
    pub fn start<P: AsRef<Path>>(
        path: P,
        config: IndexerConfig,
        resources: &dyn ResourceProvider,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let language = config.language();
        let locale = config.numeric_locale();
        let mut degradations = Vec::new();

        let filter = TermFilter::load(&language, &locale, resources)?;
        if !filter.detects_numbers() {
            degradations.push(Degradation::NumberParsingUnavailable { locale });
        }

        let stemmer = LanguageStemmer::for_language(language.code());
        if stemmer.is_none() {
            log::info!(
                "no stemmer for language '{}'; terms will not be stemmed",
                language.code()
            );
            degradations.push(Degradation::StemmingUnavailable {
                language: language.code().to_string(),
            });
        }

        let metadata = StoreMetadata::new(language.tag(), filter.source());
        let generator = Arc::new(TermGenerator::new(Arc::new(filter), stemmer));
        let builder = DocumentBuilder::new(generator, config.boosts.clone());
        let writer = IndexWriter::begin(&path, builder, &metadata, config.storage.clone())?;

        let shared = Arc::new(BuildShared::new());
        let worker = worker::spawn(writer, Arc::clone(&shared), config.flush_threshold)?;
        let blob = Arc::new(IndexBlob::new(Arc::clone(&shared), path));

        Ok(Indexer {
            config,
            language,
            degradations,
            shared,
            blob,
            worker: Some(worker),
        })
    }

    /// Queue a token for indexing. Never waits for the worker.
    pub fn submit(&self, token: IndexToken) -> Result<()> {
        self.shared.queue.submit(token)?;
        self.shared.stats.lock().submitted += 1;
        Ok(())
    }

    /// Turn an article into a token and queue it, unless it is not indexable.
    pub fn handle_article(
        &self,
        article: &Article,
        parser: &dyn ArticleParser,
    ) -> Result<ArticleOutcome> {
        let (token, outcome) = tokenize_article(article, parser);
        match token {
            Some(token) => {
                self.submit(token)?;
                if let ArticleOutcome::QueuedDegraded { .. } = outcome {
                    self.shared.stats.lock().degraded += 1;
                }
            }
            None => self.shared.stats.lock().skipped += 1,
        }
        Ok(outcome)
    }

    /// Queue a checkpoint after everything submitted so far.
    pub fn flush(&self) -> Result<()> {
        self.shared.queue.request_flush()
    }

    /// Whether queued work remains or is being processed.
    pub fn is_running(&self) -> bool {
        self.shared.queue.is_running()
    }

    /// The completion handle for the finished index.
    pub fn blob(&self) -> Arc<IndexBlob> {
        Arc::clone(&self.blob)
    }

    /// Final path of the index file.
    pub fn path(&self) -> &Path {
        self.blob.path()
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Features this build runs without.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    pub fn stats(&self) -> IndexerStats {
        *self.shared.stats.lock()
    }

    /// Largest queue depth seen during the build.
    pub fn high_water_mark(&self) -> usize {
        self.shared.queue.high_water_mark()
    }

    /// Process everything queued, finalize the index and stop the worker.
    pub fn finish(mut self) -> Result<FinalizeReport> {
        self.shared.queue.drain();
        self.shared.queue.wait_idle();
        self.join_worker();
        self.shared.outcome.lock().clone().into_result()
    }

    /// Abandon the build, removing the store and any final file.
    ///
    /// Tokens still queued are processed first.
    pub fn abort(mut self) {
        self.shared.queue.shutdown();
        self.join_worker();
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("indexing worker panicked");
            }
        }
    }
}

impl Drop for Indexer {
    fn drop(&mut self) {
        if self.shared.queue.shutdown() {
            log::debug!(
                "index build of {} dropped unfinished; aborting",
                self.path().display()
            );
        }
        self.join_worker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemoryResources;
    use tempfile::TempDir;

    fn resources() -> MemoryResources {
        MemoryResources::new()
            .with("stopwords/eng", "the\nof\nis")
            .with("stopwords/xxx", "foo")
    }

    fn token(url: &str, content: &str) -> IndexToken {
        IndexToken {
            url: url.to_string(),
            title: url.to_string(),
            accented_title: url.to_string(),
            content: content.to_string(),
            word_count: "1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_english_build_has_no_degradations() {
        let dir = TempDir::new().unwrap();
        let indexer = Indexer::start(
            dir.path().join("en.idx"),
            IndexerConfig::new("eng"),
            &resources(),
        )
        .unwrap();

        assert!(indexer.degradations().is_empty());
        assert_eq!(indexer.language().code(), "en");
    }

    #[test]
    fn test_unknown_language_degrades() {
        let dir = TempDir::new().unwrap();
        let indexer = Indexer::start(
            dir.path().join("xx.idx"),
            IndexerConfig::new("xxx"),
            &resources(),
        )
        .unwrap();

        assert_eq!(
            indexer.degradations(),
            &[
                Degradation::NumberParsingUnavailable {
                    locale: "xxx".to_string()
                },
                Degradation::StemmingUnavailable {
                    language: "xxx".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_region_tag_is_recorded_verbatim() {
        let dir = TempDir::new().unwrap();
        let resources = MemoryResources::new().with("stopwords/pt-BR", "de\no");
        let indexer = Indexer::start(
            dir.path().join("pt.idx"),
            IndexerConfig::new("pt-BR"),
            &resources,
        )
        .unwrap();
        assert_eq!(indexer.language().code(), "pt");

        let reader = indexer.blob().reader().unwrap();
        assert_eq!(reader.language(), Some("pt-BR"));
        assert_eq!(reader.stopwords(), Some("de\no"));
    }

    #[test]
    fn test_missing_stopwords_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Indexer::start(
            dir.path().join("de.idx"),
            IndexerConfig::new("deu"),
            &resources(),
        );

        assert!(result.is_err());
        assert!(!dir.path().join("de.idx.tmp").exists());
    }

    #[test]
    fn test_finish_reports_counts() {
        let dir = TempDir::new().unwrap();
        let indexer = Indexer::start(
            dir.path().join("en.idx"),
            IndexerConfig::new("eng").with_flush_threshold(2),
            &resources(),
        )
        .unwrap();

        for i in 0..5 {
            indexer.submit(token(&format!("A/{i}"), "rivers")).unwrap();
        }
        let report = indexer.finish().unwrap();

        assert_eq!(report.compact.documents, 5);
        assert_eq!(report.stats.commits, 3);
        assert!(report.path.is_file());
    }

    #[test]
    fn test_drop_aborts_build() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("en.idx");
        let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources()).unwrap();
        indexer.submit(token("A/1", "rivers")).unwrap();
        drop(indexer);

        assert!(!path.exists());
        assert!(!dir.path().join("en.idx.tmp").exists());
    }

    #[test]
    fn test_submit_after_finish_request_is_rejected() {
        let dir = TempDir::new().unwrap();
        let indexer = Indexer::start(
            dir.path().join("en.idx"),
            IndexerConfig::new("eng"),
            &resources(),
        )
        .unwrap();

        indexer.blob().data().unwrap();
        assert!(indexer.submit(token("A/1", "late")).is_err());
        assert!(!indexer.is_running());
    }
}
