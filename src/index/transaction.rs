//! Durable transactions for the build-time store.
//!
//! Documents are buffered in an open [`Transaction`]. Committing writes the
//! whole batch to a `.partial` file, syncs it, then renames it to its final
//! `batch_<seq>.seg` name. A batch therefore either exists completely or not
//! at all: a crash loses only the transaction that was still open.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::IndexDocument;
use crate::error::{FolioError, Result};
use crate::index::StoreMetadata;
use crate::storage::Storage;
use crate::storage::structured::{StructReader, StructWriter};

/// Name of the metadata file inside the store.
pub const METADATA_FILE: &str = "metadata.json";

const BATCH_PREFIX: &str = "batch_";
const BATCH_EXTENSION: &str = ".seg";
const PARTIAL_EXTENSION: &str = ".partial";
const BATCH_MAGIC: u32 = 0x424C_4F46; // "FOLB"

/// Transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is open and accepting documents.
    Active,
    /// Transaction is committed.
    Committed,
    /// Transaction was discarded.
    Aborted,
}

/// A batch of document additions committed atomically.
#[derive(Debug)]
pub struct Transaction {
    seq: u64,
    state: TransactionState,
    documents: Vec<IndexDocument>,
}

impl Transaction {
    fn new(seq: u64) -> Self {
        Transaction {
            seq,
            state: TransactionState::Active,
            documents: Vec::new(),
        }
    }

    /// Add a document to this transaction.
    pub fn add(&mut self, document: IndexDocument) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(FolioError::index(
                "Cannot add documents to inactive transaction",
            ));
        }
        self.documents.push(document);
        Ok(())
    }

    /// Discard every buffered document.
    pub fn abort(&mut self) -> Result<()> {
        if self.state == TransactionState::Committed {
            return Err(FolioError::index("Cannot abort committed transaction"));
        }
        self.documents.clear();
        self.state = TransactionState::Aborted;
        Ok(())
    }

    /// Sequence number of this transaction.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Current state.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Number of buffered documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are buffered.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct CommittedBatch {
    seq: u64,
    documents: Vec<IndexDocument>,
}

/// The committed batches and metadata of one store.
#[derive(Debug)]
pub struct TransactionLog {
    storage: Arc<dyn Storage>,
    next_seq: u64,
}

impl TransactionLog {
    /// Open the log kept in `storage`, continuing after any committed batch.
    ///
    /// Files left half-written by an interrupted commit are removed.
    pub fn open(storage: Arc<dyn Storage>) -> Result<Self> {
        let partials: Vec<String> = storage
            .list_files()?
            .into_iter()
            .filter(|name| name.ends_with(PARTIAL_EXTENSION))
            .collect();
        for name in &partials {
            log::debug!("removing interrupted write {name}");
            storage.delete_file(name)?;
        }
        if !partials.is_empty() {
            storage.sync()?;
        }

        let next_seq = batch_names(storage.as_ref())?
            .iter()
            .filter_map(|name| batch_seq(name))
            .max()
            .map_or(1, |seq| seq + 1);

        Ok(TransactionLog { storage, next_seq })
    }

    /// Begin a new transaction.
    pub fn begin(&mut self) -> Transaction {
        let transaction = Transaction::new(self.next_seq);
        self.next_seq += 1;
        transaction
    }

    /// Make `transaction` durable.
    ///
    /// An empty transaction commits without touching storage.
    pub fn commit(&mut self, transaction: &mut Transaction) -> Result<()> {
        if transaction.state != TransactionState::Active {
            return Err(FolioError::index("Cannot commit inactive transaction"));
        }

        if !transaction.documents.is_empty() {
            let batch = CommittedBatch {
                seq: transaction.seq,
                documents: std::mem::take(&mut transaction.documents),
            };
            let payload = bincode::serialize(&batch)?;

            let name = batch_name(batch.seq);
            let partial = format!("{name}{PARTIAL_EXTENSION}");
            {
                let output = self.storage.create_output(&partial)?;
                let mut writer = StructWriter::new(output);
                writer.write_u32(BATCH_MAGIC)?;
                writer.write_bytes(&payload)?;
                let mut output = writer.finish()?;
                output.flush_and_sync()?;
            }
            self.storage.rename_file(&partial, &name)?;
            self.storage.sync()?;

            log::debug!(
                "committed transaction {} ({} documents)",
                batch.seq,
                batch.documents.len()
            );
        }

        transaction.state = TransactionState::Committed;
        Ok(())
    }

    /// Persist the store metadata.
    pub fn write_metadata(&self, metadata: &StoreMetadata) -> Result<()> {
        let partial = format!("{METADATA_FILE}{PARTIAL_EXTENSION}");
        {
            let mut output = self.storage.create_output(&partial)?;
            serde_json::to_writer_pretty(&mut output, metadata)?;
            output.flush_and_sync()?;
        }
        self.storage.rename_file(&partial, METADATA_FILE)?;
        self.storage.sync()
    }

    /// Read the store metadata.
    pub fn read_metadata(&self) -> Result<StoreMetadata> {
        if !self.storage.file_exists(METADATA_FILE) {
            return Err(FolioError::corruption(format!(
                "store has no {METADATA_FILE}"
            )));
        }
        let input = self.storage.open_input(METADATA_FILE)?;
        Ok(serde_json::from_reader(input)?)
    }

    /// Number of committed batches.
    pub fn committed_batches(&self) -> Result<usize> {
        Ok(batch_names(self.storage.as_ref())?.len())
    }

    /// Every committed document, in commit order.
    ///
    /// Partially written batches (left by a crash mid-commit) are ignored.
    pub fn recover(&self) -> Result<Vec<IndexDocument>> {
        let mut documents = Vec::new();
        self.for_each_batch(|batch| {
            documents.extend(batch);
            Ok(())
        })?;
        Ok(documents)
    }

    /// Visit the documents of every committed batch, in commit order, one
    /// batch at a time.
    pub fn for_each_batch<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Vec<IndexDocument>) -> Result<()>,
    {
        for name in batch_names(self.storage.as_ref())? {
            let input = self.storage.open_input(&name)?;
            let mut reader = StructReader::new(input);
            let magic = reader.read_u32()?;
            if magic != BATCH_MAGIC {
                return Err(FolioError::corruption(format!("{name}: bad batch header")));
            }
            let payload = reader.read_bytes()?;
            reader.verify_checksum()?;

            let batch: CommittedBatch = bincode::deserialize(&payload)?;
            visit(batch.documents)?;
        }
        Ok(())
    }
}

fn batch_name(seq: u64) -> String {
    format!("{BATCH_PREFIX}{seq:010}{BATCH_EXTENSION}")
}

fn batch_seq(name: &str) -> Option<u64> {
    name.strip_prefix(BATCH_PREFIX)?
        .strip_suffix(BATCH_EXTENSION)?
        .parse()
        .ok()
}

/// Committed batch files, in sequence order.
fn batch_names(storage: &dyn Storage) -> Result<Vec<String>> {
    let mut names: Vec<(u64, String)> = storage
        .list_files()?
        .into_iter()
        .filter_map(|name| batch_seq(&name).map(|seq| (seq, name)))
        .collect();
    names.sort();
    Ok(names.into_iter().map(|(_, name)| name).collect())
}
