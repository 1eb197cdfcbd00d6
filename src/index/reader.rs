//! Read-only access to a finalized index.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use ahash::AHashMap;

use crate::error::{FolioError, Result};
use crate::index::compact::{COMPACT_MAGIC, FORMAT_VERSION};
use crate::index::{DocId, LANGUAGE_KEY, STOPWORDS_KEY, StoreMetadata};
use crate::storage::structured::StructReader;

/// One posting: a document and the term's within-document frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub wdf: u32,
}

/// A document as stored in the compact file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredDocument {
    /// The opaque payload (the article url).
    pub payload: String,
    /// Value slots.
    pub values: BTreeMap<u32, String>,
    /// Sum of the document's term frequencies.
    pub length: u64,
}

impl StoredDocument {
    /// Value stored in `slot`, if any.
    pub fn value(&self, slot: u32) -> Option<&str> {
        self.values.get(&slot).map(String::as_str)
    }
}

/// A finalized index loaded into memory.
#[derive(Debug, Clone)]
pub struct IndexReader {
    metadata: StoreMetadata,
    documents: Vec<StoredDocument>,
    terms: BTreeMap<String, Vec<Posting>>,
    by_payload: AHashMap<String, DocId>,
}

impl IndexReader {
    /// Open the compact index file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            FolioError::storage(format!("Failed to read index {}: {e}", path.display()))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Decode a compact index held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(StructReader::new(bytes))
    }

    fn decode<R: Read>(mut reader: StructReader<R>) -> Result<Self> {
        if reader.read_u32()? != COMPACT_MAGIC {
            return Err(FolioError::corruption("not a folio index"));
        }
        let version = reader.read_u32()?;
        if version != FORMAT_VERSION {
            return Err(FolioError::corruption(format!(
                "unsupported index version {version}"
            )));
        }

        let mut metadata = StoreMetadata::default();
        for _ in 0..reader.read_len()? {
            let key = reader.read_string()?;
            let value = reader.read_string()?;
            metadata.set(key, value);
        }

        let doc_count = reader.read_len()?;
        let mut documents = Vec::with_capacity(doc_count.min(1 << 20));
        let mut by_payload = AHashMap::with_capacity(doc_count.min(1 << 20));
        for doc_id in 0..doc_count {
            let payload = reader.read_string()?;
            let mut values = BTreeMap::new();
            for _ in 0..reader.read_len()? {
                let slot = read_u32_varint(&mut reader)?;
                values.insert(slot, reader.read_string()?);
            }
            let length = reader.read_varint()?;

            by_payload.insert(payload.clone(), doc_id as DocId);
            documents.push(StoredDocument {
                payload,
                values,
                length,
            });
        }

        let mut terms = BTreeMap::new();
        for _ in 0..reader.read_len()? {
            let term = reader.read_string()?;
            let count = reader.read_len()?;
            let mut postings = Vec::with_capacity(count.min(doc_count));
            let mut doc_id: DocId = 0;
            for _ in 0..count {
                let delta = read_u32_varint(&mut reader)?;
                doc_id = doc_id
                    .checked_add(delta)
                    .filter(|&id| (id as usize) < doc_count)
                    .ok_or_else(|| FolioError::corruption(format!("bad posting for '{term}'")))?;
                let wdf = read_u32_varint(&mut reader)?;
                postings.push(Posting { doc_id, wdf });
            }
            terms.insert(term, postings);
        }

        reader.verify_checksum()?;

        Ok(IndexReader {
            metadata,
            documents,
            terms,
            by_payload,
        })
    }

    /// Number of documents.
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// The document with id `doc_id`.
    pub fn document(&self, doc_id: DocId) -> Option<&StoredDocument> {
        self.documents.get(doc_id as usize)
    }

    /// Iterate over all documents in id order.
    pub fn documents(&self) -> impl Iterator<Item = (DocId, &StoredDocument)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(id, document)| (id as DocId, document))
    }

    /// Look a document up by its payload url.
    pub fn find_by_payload(&self, payload: &str) -> Option<(DocId, &StoredDocument)> {
        let doc_id = *self.by_payload.get(payload)?;
        self.document(doc_id).map(|document| (doc_id, document))
    }

    /// Postings of `term`, in doc id order. Empty when the term is unknown.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.terms.get(term).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `term` is indexed at all.
    pub fn contains_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Within-document frequency of `term` in `doc_id` (0 when absent).
    pub fn wdf(&self, term: &str, doc_id: DocId) -> u32 {
        let postings = self.postings(term);
        postings
            .binary_search_by_key(&doc_id, |posting| posting.doc_id)
            .map(|i| postings[i].wdf)
            .unwrap_or(0)
    }

    /// All indexed terms, sorted.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Terms indexed for `doc_id` with their frequencies.
    pub fn document_terms(&self, doc_id: DocId) -> Vec<(&str, u32)> {
        self.terms
            .iter()
            .filter_map(|(term, postings)| {
                postings
                    .binary_search_by_key(&doc_id, |posting| posting.doc_id)
                    .ok()
                    .map(|i| (term.as_str(), postings[i].wdf))
            })
            .collect()
    }

    /// Store-wide metadata.
    pub fn metadata(&self) -> &StoreMetadata {
        &self.metadata
    }

    /// The language tag the index was built with.
    pub fn language(&self) -> Option<&str> {
        self.metadata.get(LANGUAGE_KEY)
    }

    /// The stopword list the index was built with.
    pub fn stopwords(&self) -> Option<&str> {
        self.metadata.get(STOPWORDS_KEY)
    }

    /// Value slot numbers by name.
    pub fn value_slots(&self) -> Result<BTreeMap<String, u32>> {
        self.metadata.value_slots()
    }
}

fn read_u32_varint<R: Read>(reader: &mut StructReader<R>) -> Result<u32> {
    let value = reader.read_varint()?;
    u32::try_from(value).map_err(|_| FolioError::corruption(format!("value {value} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::IndexDocument;
    use crate::index::compact::write_compact;

    fn sample() -> Vec<u8> {
        let mut first = IndexDocument {
            payload: "A/Café".to_string(),
            ..Default::default()
        };
        first.values.insert(0, "Café".to_string());
        first.values.insert(1, "12".to_string());
        first.terms.insert("cafe".to_string(), 3);
        first.terms.insert("pari".to_string(), 1);

        let mut second = IndexDocument {
            payload: "A/Paris".to_string(),
            ..Default::default()
        };
        second.values.insert(0, "Paris".to_string());
        second.terms.insert("pari".to_string(), 5);

        let metadata = StoreMetadata::new("fra", "le\nla");
        write_compact(&metadata, &[first, second], Vec::new()).unwrap().0
    }

    #[test]
    fn test_read_documents() {
        let reader = IndexReader::from_bytes(&sample()).unwrap();

        assert_eq!(reader.doc_count(), 2);
        let (doc_id, document) = reader.find_by_payload("A/Café").unwrap();
        assert_eq!(doc_id, 0);
        assert_eq!(document.value(0), Some("Café"));
        assert_eq!(document.value(1), Some("12"));
        assert_eq!(document.length, 4);
        assert!(reader.find_by_payload("A/Missing").is_none());
    }

    #[test]
    fn test_read_postings() {
        let reader = IndexReader::from_bytes(&sample()).unwrap();

        assert_eq!(
            reader.postings("pari"),
            &[
                Posting { doc_id: 0, wdf: 1 },
                Posting { doc_id: 1, wdf: 5 }
            ]
        );
        assert_eq!(reader.wdf("cafe", 0), 3);
        assert_eq!(reader.wdf("cafe", 1), 0);
        assert!(reader.postings("missing").is_empty());
        assert_eq!(reader.document_terms(1), vec![("pari", 5)]);
        assert_eq!(reader.terms().collect::<Vec<_>>(), vec!["cafe", "pari"]);
    }

    #[test]
    fn test_read_metadata() {
        let reader = IndexReader::from_bytes(&sample()).unwrap();

        assert_eq!(reader.language(), Some("fra"));
        assert_eq!(reader.stopwords(), Some("le\nla"));
        assert_eq!(reader.value_slots().unwrap().get("wordcount"), Some(&1));
    }

    #[test]
    fn test_rejects_corrupted_file() {
        let mut bytes = sample();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            IndexReader::from_bytes(&bytes),
            Err(FolioError::Corruption(_))
        ));

        assert!(IndexReader::from_bytes(b"nope").is_err());
    }
}
