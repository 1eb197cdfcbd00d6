//! Completion bridge for pull-based consumers.
//!
//! An [`IndexBlob`] stands for the finished index file before it exists. The
//! first call to [`IndexBlob::data`] drains the queue, blocks until the
//! worker has finalized the index, and reads the file into memory; later
//! calls return the cached bytes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{FolioError, Result};
use crate::index::reader::IndexReader;
use crate::indexer::BuildShared;

/// The finished index, produced on demand.
#[derive(Debug)]
pub struct IndexBlob {
    shared: Arc<BuildShared>,
    path: PathBuf,
    data: Mutex<Option<Arc<[u8]>>>,
}

impl IndexBlob {
    pub(crate) fn new(shared: Arc<BuildShared>, path: PathBuf) -> Self {
        IndexBlob {
            shared,
            path,
            data: Mutex::new(None),
        }
    }

    /// Path of the index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the bytes have already been produced.
    pub fn is_ready(&self) -> bool {
        self.data.lock().is_some()
    }

    /// The bytes of the finished index.
    ///
    /// Ends the build: no articles are accepted afterwards. Blocks without a
    /// deadline until the worker has processed everything queued.
    pub fn data(&self) -> Result<Arc<[u8]>> {
        let mut data = self.data.lock();
        if let Some(bytes) = data.as_ref() {
            return Ok(Arc::clone(bytes));
        }

        self.shared.queue.drain();
        self.shared.queue.wait_idle();

        self.shared.outcome.lock().clone().into_result()?;
        let bytes: Arc<[u8]> = std::fs::read(&self.path)
            .map_err(|e| {
                FolioError::storage(format!("Failed to read index {}: {e}", self.path.display()))
            })?
            .into();
        *data = Some(Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Size of the finished index in bytes.
    pub fn size(&self) -> Result<u64> {
        Ok(self.data()?.len() as u64)
    }

    /// Open the finished index for lookups.
    pub fn reader(&self) -> Result<IndexReader> {
        IndexReader::from_bytes(&self.data()?)
    }
}
