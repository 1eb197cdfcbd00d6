use folio::analysis::stem::LanguageStemmer;
use folio::article::{Article, ArticleOutcome, ArticleParser, ParsedArticle};
use folio::document::IndexToken;
use folio::error::{FolioError, Result};
use folio::index::reader::IndexReader;
use folio::indexer::{Degradation, Indexer, IndexerConfig};
use folio::resource::MemoryResources;
use tempfile::TempDir;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn resources() -> MemoryResources {
    MemoryResources::new()
        .with("stopwords/eng", "the\nof\nis\na\nand\n")
        .with("stopwords/xxx", "zzz\n")
}

fn stem(word: &str) -> String {
    LanguageStemmer::for_language("en").unwrap().stem(word)
}

/// Treats the article bytes as plain text; `NOINDEX` anywhere sets the flag.
#[derive(Debug)]
struct TextParser;

impl ArticleParser for TextParser {
    fn parse(&self, data: &[u8], _mime_type: &str, _encoding: &str) -> Result<ParsedArticle> {
        let text = String::from_utf8(data.to_vec())
            .map_err(|e| FolioError::analysis(e.to_string()))?;
        Ok(ParsedArticle {
            noindex: text.contains("NOINDEX"),
            text,
            ..Default::default()
        })
    }
}

#[derive(Debug)]
struct BrokenParser;

impl ArticleParser for BrokenParser {
    fn parse(&self, _data: &[u8], _mime_type: &str, _encoding: &str) -> Result<ParsedArticle> {
        Err(FolioError::analysis("malformed markup"))
    }
}

#[test]
fn test_round_trip_keeps_accented_title_and_drops_noise() -> Result<()> {
    init_logger();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wiki.idx");

    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;
    assert!(indexer.degradations().is_empty());

    indexer.submit(IndexToken {
        url: "A/1".to_string(),
        title: "Cafe".to_string(),
        accented_title: "Café".to_string(),
        content: "the rivers of number 1000 running".to_string(),
        word_count: "4".to_string(),
        ..Default::default()
    })?;
    let report = indexer.finish()?;
    assert_eq!(report.compact.documents, 1);

    let reader = IndexReader::open(&path)?;
    let (doc_id, document) = reader.find_by_payload("A/1").unwrap();
    assert_eq!(document.value(0), Some("Café"));
    assert_eq!(document.value(1), Some("4"));

    for word in ["rivers", "number", "running", "cafe"] {
        let term = stem(word);
        assert!(reader.wdf(&term, doc_id) > 0, "missing term {term}");
    }
    assert_eq!(reader.wdf(&stem("running"), doc_id), 1);
    assert!(!reader.contains_term("1000"));
    assert!(!reader.contains_term("the"));
    assert!(!reader.contains_term("of"));

    assert_eq!(reader.language(), Some("eng"));
    assert_eq!(reader.stopwords(), Some("the\nof\nis\na\nand\n"));
    assert_eq!(reader.value_slots()?.get("title"), Some(&0));
    Ok(())
}

#[test]
fn test_every_valid_article_is_retrievable() -> Result<()> {
    init_logger();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("many.idx");

    let indexer = Indexer::start(
        &path,
        IndexerConfig::new("eng").with_flush_threshold(7),
        &resources(),
    )?;

    std::thread::scope(|scope| {
        for producer in 0..4 {
            let indexer = &indexer;
            scope.spawn(move || {
                for i in 0..25 {
                    let article = Article::html(
                        'A',
                        format!("P{producer}_{i}"),
                        format!("Page {producer} {i}"),
                        format!("content about topic {i}"),
                    );
                    let outcome = indexer.handle_article(&article, &TextParser).unwrap();
                    assert_eq!(outcome, ArticleOutcome::Queued);
                }
            });
        }
    });

    let stats = indexer.stats();
    assert_eq!(stats.submitted, 100);
    assert!(indexer.high_water_mark() >= 1);

    let blob = indexer.blob();
    let reader = blob.reader()?;
    assert_eq!(reader.doc_count(), 100);
    for producer in 0..4 {
        for i in 0..25 {
            let url = format!("A/P{producer}_{i}");
            assert!(reader.find_by_payload(&url).is_some(), "missing {url}");
        }
    }

    assert_eq!(indexer.stats().indexed, 100);
    assert!(indexer.stats().commits >= 14);
    Ok(())
}

#[test]
fn test_noindex_article_is_skipped_and_processing_continues() -> Result<()> {
    init_logger();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noindex.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;

    let first = Article::html('A', "First", "First", "alpha");
    let hidden = Article::html('A', "Hidden", "Hidden", "beta NOINDEX");
    let last = Article::html('A', "Last", "Last", "gamma");

    assert_eq!(indexer.handle_article(&first, &TextParser)?, ArticleOutcome::Queued);
    assert_eq!(
        indexer.handle_article(&hidden, &TextParser)?,
        ArticleOutcome::SkippedNoIndex
    );
    assert_eq!(indexer.handle_article(&last, &TextParser)?, ArticleOutcome::Queued);

    assert_eq!(indexer.stats().skipped, 1);
    indexer.finish()?;

    let reader = IndexReader::open(&path)?;
    assert_eq!(reader.doc_count(), 2);
    assert!(reader.find_by_payload("A/First").is_some());
    assert!(reader.find_by_payload("A/Hidden").is_none());
    assert!(reader.find_by_payload("A/Last").is_some());
    Ok(())
}

#[test]
fn test_parse_failure_still_queues_article() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;

    let article = Article::html('A', "Broken", "Broken page", "<html");
    let outcome = indexer.handle_article(&article, &BrokenParser)?;
    assert!(matches!(outcome, ArticleOutcome::QueuedDegraded { .. }));
    assert_eq!(indexer.stats().degraded, 1);

    let reader = indexer.blob().reader()?;
    let (_, document) = reader.find_by_payload("A/Broken").unwrap();
    assert_eq!(document.value(0), Some("Broken page"));
    assert_eq!(document.value(1), Some("0"));
    Ok(())
}

#[test]
fn test_blob_before_any_article_yields_empty_index() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;

    let blob = indexer.blob();
    let first = blob.data()?;
    let second = blob.data()?;
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(blob.is_ready());

    let reader = IndexReader::from_bytes(&first)?;
    assert_eq!(reader.doc_count(), 0);
    assert_eq!(reader.term_count(), 0);
    assert!(!indexer.is_running());
    assert!(path.is_file());
    assert!(!dir.path().join("empty.idx.tmp").exists());
    Ok(())
}

#[test]
fn test_empty_title_yields_no_title_postings() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("untitled.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;

    indexer.submit(IndexToken {
        url: "A/untitled".to_string(),
        content: "lonely word".to_string(),
        word_count: "2".to_string(),
        ..Default::default()
    })?;
    let reader = indexer.blob().reader()?;

    let (doc_id, document) = reader.find_by_payload("A/untitled").unwrap();
    assert_eq!(document.value(0), Some(""));
    let terms = reader.document_terms(doc_id);
    assert_eq!(terms.len(), 2);
    assert!(terms.iter().all(|(_, wdf)| *wdf == 1));
    Ok(())
}

#[test]
fn test_title_terms_are_boosted() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("boost.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;

    let long_content = "filler ".repeat(200);
    indexer.submit(IndexToken {
        url: "A/boosted".to_string(),
        title: "Lighthouse".to_string(),
        accented_title: "Lighthouse".to_string(),
        keywords: "beacon".to_string(),
        content: long_content.clone(),
        word_count: "200".to_string(),
    })?;
    let reader = indexer.blob().reader()?;

    let (doc_id, _) = reader.find_by_payload("A/boosted").unwrap();
    let expected_title_boost = (long_content.len() / 500 + 1) as u32;
    assert_eq!(reader.wdf(&stem("lighthouse"), doc_id), expected_title_boost);
    assert_eq!(reader.wdf(&stem("beacon"), doc_id), 3);
    assert_eq!(reader.wdf(&stem("filler"), doc_id), 200);
    Ok(())
}

#[test]
fn test_unknown_language_degrades_but_builds() -> Result<()> {
    init_logger();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("xx.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("xxx"), &resources())?;

    assert!(indexer.degradations().contains(&Degradation::StemmingUnavailable {
        language: "xxx".to_string()
    }));
    assert!(indexer
        .degradations()
        .contains(&Degradation::NumberParsingUnavailable {
            locale: "xxx".to_string()
        }));

    indexer.submit(IndexToken {
        url: "A/x".to_string(),
        content: "running 1000 zzz".to_string(),
        ..Default::default()
    })?;
    let reader = indexer.blob().reader()?;

    assert!(reader.contains_term("running"));
    assert!(reader.contains_term("1000"));
    assert!(!reader.contains_term("zzz"));
    Ok(())
}

#[test]
fn test_abort_removes_everything() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("aborted.idx");
    let indexer = Indexer::start(&path, IndexerConfig::new("eng"), &resources())?;
    let blob = indexer.blob();

    indexer.submit(IndexToken::new("A/1"))?;
    indexer.flush()?;
    indexer.abort();

    assert!(!path.exists());
    assert!(!dir.path().join("aborted.idx.tmp").exists());
    assert!(matches!(blob.data(), Err(FolioError::InvalidOperation(_))));
    Ok(())
}

#[test]
fn test_fast_producer_is_never_blocked() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("burst.idx");
    let indexer = Indexer::start(
        &path,
        IndexerConfig::new("eng").with_flush_threshold(500),
        &resources(),
    )?;

    // Each document costs the worker far more than a submit costs the
    // producer, so the backlog grows while the burst is queued.
    let content = "rivers running through mountain valleys ".repeat(250);
    for i in 0..2_000 {
        let mut token = IndexToken::new(format!("A/{i}"));
        token.content = content.clone();
        indexer.submit(token)?;
    }
    assert_eq!(indexer.stats().submitted, 2_000);
    assert!(
        indexer.high_water_mark() > 100,
        "queue depth peaked at {}",
        indexer.high_water_mark()
    );

    let report = indexer.finish()?;
    assert_eq!(report.compact.documents, 2_000);
    Ok(())
}

#[test]
fn test_lost_build_store_fails_the_build() -> Result<()> {
    init_logger();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lost.idx");
    let temp_path = dir.path().join("lost.idx.tmp");
    let indexer = Indexer::start(
        &path,
        IndexerConfig::new("eng").with_flush_threshold(1),
        &resources(),
    )?;
    assert!(temp_path.is_dir());

    std::fs::remove_dir_all(&temp_path).unwrap();
    for url in ["A/1", "A/2", "A/3"] {
        let mut token = IndexToken::new(url);
        token.content = "stranded words".to_string();
        indexer.submit(token)?;
    }

    let blob = indexer.blob();
    let error = blob.data().unwrap_err();
    assert!(matches!(error, FolioError::BuildFailed(_)), "{error}");
    assert!(matches!(error.root_cause(), FolioError::Storage(_)), "{error}");
    assert!(!blob.is_ready());

    let stats = indexer.stats();
    assert_eq!(stats.indexed, 0);
    assert_eq!(stats.discarded, 2);

    assert!(matches!(indexer.finish(), Err(FolioError::BuildFailed(_))));
    assert!(!path.exists());
    assert!(!temp_path.exists());
    Ok(())
}
