//! Utility modules for Folio.

pub mod varint;
