//! Error types for the Folio library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`FolioError`] enum. Linguistic problems (missing locale data, no stemmer)
//! are not errors; they are reported as [`Degradation`](crate::indexer::Degradation)
//! values instead. Storage failures are always surfaced as errors and end the build.
//!
//! # Examples
//!
//! ```
//! use folio::error::{FolioError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(FolioError::invalid_operation("index already finalized"))
//! }
//!
//! assert!(example_operation().is_err());
//! ```

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// The main error type for Folio operations.
#[derive(Error, Debug)]
pub enum FolioError {
    /// I/O errors (file operations, directory handling, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A required resource (e.g. a stopword list) could not be loaded
    #[error("Resource error: {0}")]
    Resource(String),

    /// Persisted data failed validation (bad magic, checksum mismatch, truncation)
    #[error("Corrupted data: {0}")]
    Corruption(String),

    /// Operation not valid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// The index build stopped on a fatal error; every caller waiting on the
    /// build sees the same underlying cause
    #[error("Index build failed: {0}")]
    BuildFailed(#[source] Arc<FolioError>),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with FolioError.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        FolioError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        FolioError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        FolioError::Analysis(msg.into())
    }

    /// Create a new resource error.
    pub fn resource<S: Into<String>>(msg: S) -> Self {
        FolioError::Resource(msg.into())
    }

    /// Create a new corruption error.
    pub fn corruption<S: Into<String>>(msg: S) -> Self {
        FolioError::Corruption(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        FolioError::InvalidOperation(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FolioError::Other(msg.into())
    }

    /// The error behind a failed build, or `self` for any other error.
    pub fn root_cause(&self) -> &FolioError {
        match self {
            FolioError::BuildFailed(cause) => cause.root_cause(),
            other => other,
        }
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        FolioError::Other(format!("Not found: {}", msg.into()))
    }
}
