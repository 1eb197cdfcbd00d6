//! Structured binary I/O with a running CRC-32.
//!
//! [`StructWriter`] and [`StructReader`] encode little-endian integers,
//! varints and length-prefixed strings while hashing every byte. The writer
//! appends the checksum as a trailer; the reader verifies it.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{FolioError, Result};
use crate::util::varint::{decode_u64, encode_u64};

/// A structured file writer for binary data.
pub struct StructWriter<W: Write> {
    writer: W,
    hasher: Hasher,
    position: u64,
}

impl<W: Write> StructWriter<W> {
    /// Create a new structured file writer.
    pub fn new(writer: W) -> Self {
        StructWriter {
            writer,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.track(&value.to_le_bytes());
        Ok(())
    }

    /// Write a variable-length integer.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let encoded = encode_u64(value);
        self.write_raw(&encoded)
    }

    /// Write a string with length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write raw bytes with length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.write_raw(value)
    }

    /// Write raw bytes without length prefix.
    pub fn write_raw(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        self.track(value);
        Ok(())
    }

    /// Bytes written so far, excluding the trailer.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Append the checksum trailer and hand back the inner writer.
    pub fn finish(mut self) -> Result<W> {
        let checksum = self.hasher.clone().finalize();
        self.writer.write_u32::<LittleEndian>(checksum)?;
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn track(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.position += data.len() as u64;
    }
}

/// A structured file reader for binary data.
pub struct StructReader<R: Read> {
    reader: R,
    hasher: Hasher,
}

impl<R: Read> StructReader<R> {
    /// Create a new structured file reader.
    pub fn new(reader: R) -> Self {
        StructReader {
            reader,
            hasher: Hasher::new(),
        }
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.reader.read_u32::<LittleEndian>()?;
        self.track(&value.to_le_bytes());
        Ok(value)
    }

    /// Read a variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut bytes = Vec::with_capacity(10);
        loop {
            let byte = self.reader.read_u8()?;
            bytes.push(byte);
            if byte & 0x80 == 0 {
                break;
            }
            if bytes.len() > 10 {
                return Err(FolioError::corruption("VarInt overflow"));
            }
        }

        let (value, _) = decode_u64(&bytes)?;
        self.track(&bytes);
        Ok(value)
    }

    /// Read a varint that must fit in memory as a length or count.
    pub fn read_len(&mut self) -> Result<usize> {
        let value = self.read_varint()?;
        usize::try_from(value)
            .map_err(|_| FolioError::corruption(format!("length {value} out of range")))
    }

    /// Read a string with length prefix.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|e| FolioError::corruption(format!("Invalid UTF-8: {e}")))
    }

    /// Read bytes with length prefix.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.read_len()?;
        self.read_raw(length)
    }

    /// Read exact number of raw bytes.
    pub fn read_raw(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut bytes)?;
        if bytes.len() != length {
            return Err(FolioError::corruption("unexpected end of data"));
        }
        self.track(&bytes);
        Ok(bytes)
    }

    /// Read the checksum trailer and compare it with the bytes consumed.
    pub fn verify_checksum(mut self) -> Result<()> {
        let expected = self.reader.read_u32::<LittleEndian>()?;
        let actual = self.hasher.clone().finalize();
        if expected != actual {
            return Err(FolioError::corruption(format!(
                "checksum mismatch: expected {expected:08x}, found {actual:08x}"
            )));
        }
        Ok(())
    }

    fn track(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }
}
