//! The single indexing worker.
//!
//! The worker thread owns the [`IndexWriter`] and consumes the queue in FIFO
//! order. A storage error is fatal to the build: the writer is dropped (which
//! removes its files), the error is latched as the outcome and every later
//! item is discarded until a sentinel arrives.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::document::IndexToken;
use crate::error::{FolioError, Result};
use crate::index::writer::{FinalizeReport, IndexWriter};
use crate::indexer::BuildShared;
use crate::indexer::queue::{IndexQueue, QueueItem};

/// How the worker ended, or that it has not yet.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    Running,
    Finalized(FinalizeReport),
    Failed(Arc<FolioError>),
    Aborted,
}

impl WorkerOutcome {
    /// The finalize report, or the reason there is none.
    pub fn into_result(self) -> Result<FinalizeReport> {
        match self {
            WorkerOutcome::Finalized(report) => Ok(report),
            WorkerOutcome::Failed(cause) => Err(FolioError::BuildFailed(cause)),
            WorkerOutcome::Aborted => Err(FolioError::invalid_operation("index build was aborted")),
            WorkerOutcome::Running => Err(FolioError::index(
                "indexing worker stopped before finishing",
            )),
        }
    }
}

/// Closes the queue when the worker exits, however it exits.
struct ReleaseOnExit<'a>(&'a IndexQueue);

impl Drop for ReleaseOnExit<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

pub(crate) fn spawn(
    writer: IndexWriter,
    shared: Arc<BuildShared>,
    flush_threshold: usize,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("folio-indexer".to_string())
        .spawn(move || run(writer, &shared, flush_threshold))
        .map_err(|e| FolioError::index(format!("Failed to start indexing worker: {e}")))
}

fn run(writer: IndexWriter, shared: &BuildShared, flush_threshold: usize) {
    let _release = ReleaseOnExit(&shared.queue);
    let receiver = shared.queue.receiver();
    let mut writer = Some(writer);
    let mut since_flush = 0;

    while let Ok(item) = receiver.recv() {
        let stop = match item {
            QueueItem::Article(token) => {
                let result = writer
                    .as_mut()
                    .map(|active| index_one(active, &token, &mut since_flush, flush_threshold));
                match result {
                    Some(Ok(commits)) => shared.record_indexed(commits),
                    Some(Err(e)) => fail(&mut writer, shared, e),
                    None => shared.stats.lock().discarded += 1,
                }
                false
            }
            QueueItem::Flush => {
                since_flush = 0;
                let result = writer
                    .as_mut()
                    .map(|active| active.flush().map(|()| active.stats().commits));
                match result {
                    Some(Ok(commits)) => shared.stats.lock().commits = commits,
                    Some(Err(e)) => fail(&mut writer, shared, e),
                    None => {}
                }
                false
            }
            QueueItem::Drain => {
                if let Some(active) = writer.take() {
                    match active.finalize() {
                        Ok(report) => {
                            shared.stats.lock().commits = report.stats.commits;
                            *shared.outcome.lock() = WorkerOutcome::Finalized(report);
                        }
                        Err(e) => {
                            log::error!("finalizing index failed: {e}");
                            *shared.outcome.lock() = WorkerOutcome::Failed(Arc::new(e));
                        }
                    }
                }
                true
            }
            QueueItem::Shutdown => {
                if let Some(active) = writer.take() {
                    let report = active.abort();
                    if !report.is_clean() {
                        log::debug!("cleanup left files behind: {:?}", report.failures);
                    }
                    *shared.outcome.lock() = WorkerOutcome::Aborted;
                }
                true
            }
        };

        shared.queue.complete_one();
        if stop {
            break;
        }
    }
}

/// Add one token, checkpointing every `flush_threshold` documents.
fn index_one(
    writer: &mut IndexWriter,
    token: &IndexToken,
    since_flush: &mut usize,
    flush_threshold: usize,
) -> Result<u64> {
    writer.add(token)?;
    *since_flush += 1;
    if flush_threshold > 0 && *since_flush >= flush_threshold {
        *since_flush = 0;
        writer.flush()?;
    }
    Ok(writer.stats().commits)
}

fn fail(writer: &mut Option<IndexWriter>, shared: &BuildShared, error: FolioError) {
    log::error!("indexing failed, discarding the build: {error}");
    writer.take();
    *shared.outcome.lock() = WorkerOutcome::Failed(Arc::new(error));
}
