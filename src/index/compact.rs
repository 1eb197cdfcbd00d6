//! Compaction of a build-time store into one immutable file.
//!
//! Layout (integers little-endian, counts and lengths as varints):
//!
//! ```text
//! magic u32 | version u32
//! metadata:  count, (key, value)*
//! documents: count, (payload, value count, (slot, value)*, length)*
//! terms:     count, (term, posting count, (doc id delta, wdf)*)*   sorted by term
//! crc32 u32
//! ```

use std::io::Write;
use std::path::Path;

use ahash::AHashMap;

use crate::document::IndexDocument;
use crate::error::{FolioError, Result};
use crate::index::transaction::TransactionLog;
use crate::index::{DocId, StoreMetadata};
use crate::storage::Storage;
use crate::storage::file::{FileStorage, sync_directory};
use crate::storage::structured::StructWriter;

/// Magic number of a compact index file ("FLIX").
pub const COMPACT_MAGIC: u32 = 0x5849_4C46;

/// Version of the compact layout.
pub const FORMAT_VERSION: u32 = 1;

const COMPACT_PARTIAL: &str = "compact.partial";

/// Summary of one compaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    /// Documents written.
    pub documents: usize,
    /// Distinct terms written.
    pub terms: usize,
    /// Postings written across all terms.
    pub postings: usize,
    /// File size in bytes, trailer included.
    pub bytes: u64,
}

/// What the compact file keeps of one document besides its postings.
#[derive(Debug)]
struct DocumentRecord {
    payload: String,
    values: Vec<(u32, String)>,
    length: u64,
}

/// Accumulates documents for one compact file.
///
/// Each added document is reduced to its stored fields and its postings, so
/// its term map can be released right away. The postings of the whole index
/// are held in memory until [`CompactBuilder::write`].
#[derive(Debug, Default)]
pub struct CompactBuilder {
    records: Vec<DocumentRecord>,
    postings: AHashMap<String, Vec<(DocId, u32)>>,
}

impl CompactBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next document; its id is the number of documents added before.
    pub fn add(&mut self, document: &IndexDocument) -> Result<DocId> {
        let doc_id = DocId::try_from(self.records.len()).map_err(|_| {
            FolioError::index(format!(
                "too many documents for one index: {}",
                self.records.len()
            ))
        })?;

        for (term, &wdf) in &document.terms {
            match self.postings.get_mut(term.as_str()) {
                Some(list) => list.push((doc_id, wdf)),
                None => {
                    self.postings.insert(term.clone(), vec![(doc_id, wdf)]);
                }
            }
        }
        self.records.push(DocumentRecord {
            payload: document.payload.clone(),
            values: document
                .values
                .iter()
                .map(|(&slot, value)| (slot, value.clone()))
                .collect(),
            length: document.terms.values().map(|&wdf| u64::from(wdf)).sum(),
        });
        Ok(doc_id)
    }

    /// Documents added so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode everything added, with `metadata`, in the compact layout.
    pub fn write<W: Write>(self, metadata: &StoreMetadata, output: W) -> Result<(W, CompactStats)> {
        let mut terms: Vec<(String, Vec<(DocId, u32)>)> = self.postings.into_iter().collect();
        terms.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut writer = StructWriter::new(output);
        writer.write_u32(COMPACT_MAGIC)?;
        writer.write_u32(FORMAT_VERSION)?;

        writer.write_varint(metadata.len() as u64)?;
        for (key, value) in metadata.iter() {
            writer.write_string(key)?;
            writer.write_string(value)?;
        }

        writer.write_varint(self.records.len() as u64)?;
        for record in &self.records {
            writer.write_string(&record.payload)?;
            writer.write_varint(record.values.len() as u64)?;
            for (slot, value) in &record.values {
                writer.write_varint(u64::from(*slot))?;
                writer.write_string(value)?;
            }
            writer.write_varint(record.length)?;
        }

        let mut stats = CompactStats {
            documents: self.records.len(),
            terms: terms.len(),
            ..Default::default()
        };

        writer.write_varint(terms.len() as u64)?;
        for (term, list) in &terms {
            writer.write_string(term)?;
            writer.write_varint(list.len() as u64)?;
            let mut previous = 0;
            for &(doc_id, wdf) in list {
                writer.write_varint(u64::from(doc_id - previous))?;
                writer.write_varint(u64::from(wdf))?;
                previous = doc_id;
            }
            stats.postings += list.len();
        }

        stats.bytes = writer.position() + 4;
        let output = writer.finish()?;
        Ok((output, stats))
    }
}

/// Encode `documents` and `metadata` in the compact layout.
///
/// Document ids are the positions in `documents`.
pub fn write_compact<W: Write>(
    metadata: &StoreMetadata,
    documents: &[IndexDocument],
    output: W,
) -> Result<(W, CompactStats)> {
    let mut builder = CompactBuilder::new();
    for document in documents {
        builder.add(document)?;
    }
    builder.write(metadata, output)
}

/// Compact the committed contents of `store` into a single file at `dest`.
///
/// Committed batches are read one at a time, so only one batch of full
/// documents is resident at once; see [`CompactBuilder`] for what is kept.
/// The file is written inside the store directory first and renamed into
/// place once it is durable, so `dest` never holds a partial file.
pub fn compact_store(store: &FileStorage, log: &TransactionLog, dest: &Path) -> Result<CompactStats> {
    let metadata = log.read_metadata()?;
    let mut builder = CompactBuilder::new();
    log.for_each_batch(|documents| {
        for document in &documents {
            builder.add(document)?;
        }
        Ok(())
    })?;

    let stats = {
        let output = store.create_output(COMPACT_PARTIAL)?;
        let (mut output, stats) = builder.write(&metadata, output)?;
        output.flush_and_sync()?;
        stats
    };

    std::fs::rename(store.file_path(COMPACT_PARTIAL), dest).map_err(|e| {
        FolioError::storage(format!("Failed to move index to {}: {e}", dest.display()))
    })?;
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => sync_directory(parent)?,
        _ => sync_directory(Path::new("."))?,
    }

    log::debug!(
        "compacted {} documents, {} terms into {} ({} bytes)",
        stats.documents,
        stats.terms,
        dest.display(),
        stats.bytes
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(url: &str, terms: &[(&str, u32)]) -> IndexDocument {
        let mut document = IndexDocument {
            payload: url.to_string(),
            ..Default::default()
        };
        for (term, wdf) in terms {
            document.terms.insert(term.to_string(), *wdf);
        }
        document
    }

    #[test]
    fn test_write_compact_stats() {
        let documents = vec![
            document("A/1", &[("cafe", 2), ("pari", 1)]),
            document("A/2", &[("pari", 3)]),
        ];
        let metadata = StoreMetadata::new("fra", "");

        let (bytes, stats) = write_compact(&metadata, &documents, Vec::new()).unwrap();

        assert_eq!(stats.documents, 2);
        assert_eq!(stats.terms, 2);
        assert_eq!(stats.postings, 3);
        assert_eq!(stats.bytes, bytes.len() as u64);
        assert_eq!(&bytes[..4], &COMPACT_MAGIC.to_le_bytes());
    }

    #[test]
    fn test_builder_assigns_ids_in_insertion_order() {
        let mut builder = CompactBuilder::new();
        assert!(builder.is_empty());

        assert_eq!(builder.add(&document("A/1", &[("pari", 1)])).unwrap(), 0);
        assert_eq!(builder.add(&document("A/2", &[("pari", 2)])).unwrap(), 1);
        assert_eq!(builder.len(), 2);

        let documents = vec![
            document("A/1", &[("pari", 1)]),
            document("A/2", &[("pari", 2)]),
        ];
        let metadata = StoreMetadata::new("fra", "");
        let (built, _) = builder.write(&metadata, Vec::new()).unwrap();
        let (direct, _) = write_compact(&metadata, &documents, Vec::new()).unwrap();
        assert_eq!(built, direct);
    }

    #[test]
    fn test_write_compact_is_deterministic() {
        let documents = vec![
            document("A/1", &[("zeta", 1), ("alpha", 1), ("mid", 4)]),
            document("A/2", &[("alpha", 2)]),
        ];
        let metadata = StoreMetadata::new("eng", "the");

        let (first, _) = write_compact(&metadata, &documents, Vec::new()).unwrap();
        let (second, _) = write_compact(&metadata, &documents, Vec::new()).unwrap();

        assert_eq!(first, second);
    }
}
