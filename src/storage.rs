//! Storage abstraction layer for Folio.
//!
//! The index writer keeps its build-time state (metadata and committed
//! transaction batches) in a [`Storage`]: a flat namespace of named files.
//! [`FileStorage`](file::FileStorage) backs the on-disk `.tmp` store;
//! [`MemoryStorage`](memory::MemoryStorage) serves tests.
//!
//! # Example
//!
//! ```
//! use folio::storage::memory::MemoryStorage;
//! use folio::storage::Storage;
//! use std::io::{Read, Write};
//!
//! # fn main() -> folio::error::Result<()> {
//! let storage = MemoryStorage::new();
//!
//! let mut output = storage.create_output("index.bin")?;
//! output.write_all(b"test data")?;
//! output.flush_and_sync()?;
//! drop(output);
//!
//! let mut input = storage.open_input("index.bin")?;
//! let mut buffer = Vec::new();
//! input.read_to_end(&mut buffer)?;
//! assert_eq!(buffer, b"test data");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod file;
pub mod memory;
pub mod structured;

/// A trait for storage backends that can store and retrieve named files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing content.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file succeeds.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all file names, sorted.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Atomically replace `new_name` with `old_name`.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Make completed renames and deletions durable.
    fn sync(&self) -> Result<()>;
}

/// A readable file handle.
pub trait StorageInput: Read + Send + std::fmt::Debug {}

/// A writable file handle.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffers and sync the data to durable storage.
    fn flush_and_sync(&mut self) -> Result<()>;
}

/// Configuration for file-backed storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Buffer size for reads and writes.
    pub buffer_size: usize,
    /// Flush the write buffer after every write call.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 64 * 1024,
            sync_writes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();

        assert_eq!(config.buffer_size, 65536);
        assert!(!config.sync_writes);
    }
}
