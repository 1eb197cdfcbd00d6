//! Variable-length integer encoding utilities.
//!
//! Unsigned LEB128: 7 bits per byte, high bit set on every byte but the last.
//! Small numbers (document id gaps, term frequencies) take a single byte.

use crate::error::{FolioError, Result};

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10);
    let mut val = value;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;

        if val != 0 {
            byte |= 0x80; // Set continuation bit
        }

        bytes.push(byte);

        if val == 0 {
            break;
        }
    }

    bytes
}

/// Decode a u64 value from variable-length encoding.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0;

    for (index, &byte) in bytes.iter().enumerate() {
        if shift >= 64 {
            return Err(FolioError::corruption("VarInt overflow"));
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, index + 1));
        }

        shift += 7;
    }

    Err(FolioError::corruption("Incomplete VarInt"))
}
