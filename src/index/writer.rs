//! The transactional index writer.
//!
//! An [`IndexWriter`] owns the path pair of one build: the store at
//! `<path>.tmp` and the compact file at `<path>`. Documents are added inside
//! an open transaction; [`IndexWriter::flush`] commits it as a checkpoint and
//! [`IndexWriter::finalize`] compacts everything into the final file. A writer
//! dropped before finalizing removes both paths.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::document::{DocumentBuilder, IndexToken};
use crate::error::{FolioError, Result};
use crate::index::StoreMetadata;
use crate::index::compact::{CompactStats, compact_store};
use crate::index::transaction::{Transaction, TransactionLog};
use crate::storage::{Storage, StorageConfig};
use crate::storage::file::FileStorage;

/// Suffix of the build-time store directory.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Paths with a live writer in this process.
static ACTIVE_BUILDS: LazyLock<Mutex<HashSet<PathBuf>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// Lifecycle of a writer.
///
/// A writer comes into existence in `Building`; before [`IndexWriter::begin`]
/// there is no writer at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Building,
    Finalized,
    Aborted,
}

/// Counters of one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Documents added.
    pub documents: u64,
    /// Non-empty transactions committed.
    pub commits: u64,
}

/// What an abort removed and what it failed to remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    /// Whether every path was removed (or absent).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a successful finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    /// The compact index file.
    pub path: PathBuf,
    pub compact: CompactStats,
    pub stats: WriterStats,
}

/// Writes one index.
#[derive(Debug)]
pub struct IndexWriter {
    path: PathBuf,
    temp_path: PathBuf,
    builder: DocumentBuilder,
    store: Arc<FileStorage>,
    log: TransactionLog,
    transaction: Transaction,
    state: WriterState,
    stats: WriterStats,
}

/// `<path>.tmp`
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

impl IndexWriter {
    /// Start a build whose final file will live at `path`.
    ///
    /// Any leftover store at `<path>.tmp` is discarded. Fails if another
    /// writer in this process is building the same path.
    pub fn begin<P: AsRef<Path>>(
        path: P,
        builder: DocumentBuilder,
        metadata: &StoreMetadata,
        config: StorageConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let key = std::path::absolute(&path)?;
        if !ACTIVE_BUILDS.lock().insert(key.clone()) {
            return Err(FolioError::invalid_operation(format!(
                "an index is already being built at {}",
                path.display()
            )));
        }

        let temp_path = temp_path_for(&path);
        let opened = FileStorage::create_or_overwrite(&temp_path, config)
            .map(Arc::new)
            .and_then(|store| {
                let mut log = TransactionLog::open(store.clone())?;
                log.write_metadata(metadata)?;
                let transaction = log.begin();
                Ok((store, log, transaction))
            });

        let (store, log, transaction) = match opened {
            Ok(opened) => opened,
            Err(e) => {
                ACTIVE_BUILDS.lock().remove(&key);
                let _ = std::fs::remove_dir_all(&temp_path);
                return Err(e);
            }
        };

        log::debug!("began index build at {}", temp_path.display());
        Ok(IndexWriter {
            path,
            temp_path,
            builder,
            store,
            log,
            transaction,
            state: WriterState::Building,
            stats: WriterStats::default(),
        })
    }

    /// Build the document for `token` and add it to the open transaction.
    pub fn add(&mut self, token: &IndexToken) -> Result<()> {
        self.ensure_building()?;
        let document = self.builder.build(token);
        self.transaction.add(document)?;
        self.stats.documents += 1;
        Ok(())
    }

    /// Commit the open transaction and open the next one.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_building()?;
        let pending = self.transaction.len();
        self.log.commit(&mut self.transaction)?;
        if pending > 0 {
            self.stats.commits += 1;
        }
        self.transaction = self.log.begin();
        Ok(())
    }

    /// Commit everything, compact the store into `<path>` and remove the store.
    ///
    /// On error the writer is dropped, which removes both paths.
    pub fn finalize(mut self) -> Result<FinalizeReport> {
        self.flush()?;
        self.store.sync()?;

        let compact = compact_store(&self.store, &self.log, &self.path)?;
        self.state = WriterState::Finalized;

        if let Err(e) = std::fs::remove_dir_all(&self.temp_path) {
            log::warn!(
                "failed to remove build store {}: {e}",
                self.temp_path.display()
            );
        }

        log::info!(
            "finalized index {} with {} documents",
            self.path.display(),
            compact.documents
        );
        Ok(FinalizeReport {
            path: self.path.clone(),
            compact,
            stats: self.stats,
        })
    }

    /// Abandon the build and remove both the store and any final file.
    pub fn abort(mut self) -> CleanupReport {
        self.cleanup()
    }

    /// The final index path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The build-time store path.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Documents added since the last flush.
    pub fn pending_documents(&self) -> usize {
        self.transaction.len()
    }

    fn ensure_building(&self) -> Result<()> {
        match self.state {
            WriterState::Building => Ok(()),
            state => Err(FolioError::invalid_operation(format!(
                "index writer is {state:?}"
            ))),
        }
    }

    fn cleanup(&mut self) -> CleanupReport {
        self.state = WriterState::Aborted;
        let _ = self.transaction.abort();

        let mut report = CleanupReport::default();
        for path in [&self.temp_path, &self.path] {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else if path.exists() {
                std::fs::remove_file(path)
            } else {
                continue;
            };
            match result {
                Ok(()) => report.removed.push(path.clone()),
                Err(e) => report.failures.push((path.clone(), e.to_string())),
            }
        }

        log::debug!(
            "aborted index build at {}: removed {:?}, failed {:?}",
            self.path.display(),
            report.removed,
            report.failures
        );
        report
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if self.state == WriterState::Building {
            self.cleanup();
        }
        if let Ok(key) = std::path::absolute(&self.path) {
            ACTIVE_BUILDS.lock().remove(&key);
        }
    }
}
