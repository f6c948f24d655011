//! Byte cursor over a structure's formatted region.
//!
//! [`FieldReader`] performs bounds-checked little-endian reads at explicit
//! offsets and resolves string indices through the structure's string list.
//! [`TableWriter`] is the mirror: it appends fields to a growing formatted
//! region and collects the strings they reference.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::table::{Header, RawStructure, TableType};

/// Largest total structure length (header + formatted region).
pub const MAX_STRUCTURE_LEN: usize = u8::MAX as usize;

/// Text shown for string index 0
pub const NOT_SPECIFIED: &str = "Not Specified";

/// Text shown for an out-of-range string index
pub const BAD_INDEX: &str = "<BAD INDEX>";

// =============================================================================
// STRING VALUES
// =============================================================================

/// A string field as stored in a structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SmbiosString {
    /// Index 0
    #[default]
    NotSpecified,
    /// A resolved entry of the string section
    Value(String),
    /// Index past the end of the string section
    BadIndex(u8),
}

impl SmbiosString {
    /// The resolved text, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_specified(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl From<&str> for SmbiosString {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::NotSpecified
        } else {
            Self::Value(String::from(s))
        }
    }
}

impl fmt::Display for SmbiosString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSpecified => f.write_str(NOT_SPECIFIED),
            Self::Value(s) => f.write_str(s),
            Self::BadIndex(_) => f.write_str(BAD_INDEX),
        }
    }
}

// =============================================================================
// READER
// =============================================================================

/// Bounds-checked reads against a formatted region and its strings.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    strings: &'a [Vec<u8>],
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8], strings: &'a [Vec<u8>]) -> Self {
        Self { data, strings }
    }

    /// Length of the formatted region.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_bytes(&self, offset: usize, width: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(width);
        match end {
            Some(end) if end <= self.data.len() => Ok(&self.data[offset..end]),
            _ => Err(Error::OutOfRange { offset, width, len: self.data.len() }),
        }
    }

    fn read_array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.read_array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        self.read_array(offset).map(u16::from_le_bytes)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.read_array(offset).map(u32::from_le_bytes)
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        self.read_array(offset).map(u64::from_le_bytes)
    }

    /// Resolve a string index.
    ///
    /// Index 0 is [`SmbiosString::NotSpecified`]. An index past the string
    /// list fails with [`Error::BadStringIndex`]; the index byte still counts
    /// as consumed for the caller.
    pub fn read_string(&self, offset: usize) -> Result<SmbiosString> {
        let index = self.read_u8(offset)?;
        self.resolve_string(index)
    }

    pub fn resolve_string(&self, index: u8) -> Result<SmbiosString> {
        match index {
            0 => Ok(SmbiosString::NotSpecified),
            n => self
                .strings
                .get(usize::from(n) - 1)
                .map(|s| SmbiosString::Value(String::from_utf8_lossy(s).into_owned()))
                .ok_or(Error::BadStringIndex { index: n, count: self.strings.len() }),
        }
    }
}

// =============================================================================
// WRITER
// =============================================================================

/// Builds the formatted region and string section of one structure.
#[derive(Debug, Default)]
pub struct TableWriter {
    data: Vec<u8>,
    strings: Vec<Vec<u8>>,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written to the formatted region so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.data.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bytes(&mut self, v: &[u8]) {
        self.data.extend_from_slice(v);
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.data.resize(self.data.len() + n, 0);
    }

    /// Write a string index, adding the text to the string section.
    ///
    /// Identical strings share one index. Unspecified and empty strings are
    /// written as index 0 and add nothing. A [`SmbiosString::BadIndex`] has
    /// no text to write and is rejected.
    pub fn write_string(&mut self, s: &SmbiosString) -> Result<()> {
        let text = match s {
            SmbiosString::Value(text) if !text.is_empty() => text,
            SmbiosString::BadIndex(index) => {
                log::debug!("refusing to encode bad string index {}", index);
                return Err(Error::InvalidArgument("string has a bad index"));
            }
            _ => {
                self.write_u8(0);
                return Ok(());
            }
        };
        let pos = match self.strings.iter().position(|t| t.as_slice() == text.as_bytes()) {
            Some(pos) => pos,
            None => {
                self.strings.push(text.as_bytes().to_vec());
                self.strings.len() - 1
            }
        };
        let index = u8::try_from(pos + 1).map_err(|_| Error::InvalidArgument("too many strings"))?;
        self.write_u8(index);
        Ok(())
    }

    /// Finish the structure.
    ///
    /// Fails when header plus formatted region would not fit the 8-bit
    /// length field.
    pub fn finish(self, table_type: TableType, handle: u16) -> Result<RawStructure> {
        let total = self.data.len() + Header::SIZE;
        if total > MAX_STRUCTURE_LEN {
            log::debug!("{} structure is {} bytes, max is {}", table_type, total, MAX_STRUCTURE_LEN);
            return Err(Error::InvalidArgument("structure too long"));
        }
        let header = Header { table_type, length: total as u8, handle };
        Ok(RawStructure::new(header, self.data, self.strings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn strings() -> Vec<Vec<u8>> {
        vec![b"Vendor".to_vec(), b"1.0".to_vec()]
    }

    #[test]
    fn test_little_endian_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let r = FieldReader::new(&data, &[]);
        assert_eq!(r.read_u8(0).unwrap(), 0x01);
        assert_eq!(r.read_u16(0).unwrap(), 0x0201);
        assert_eq!(r.read_u32(4).unwrap(), 0x0807_0605);
        assert_eq!(r.read_u64(0).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_straddling_read_is_out_of_range() {
        let data = [0x01, 0x02, 0x03];
        let r = FieldReader::new(&data, &[]);
        assert_eq!(r.read_u16(2), Err(Error::OutOfRange { offset: 2, width: 2, len: 3 }));
        assert!(r.read_u32(0).is_err());
        assert!(r.read_bytes(usize::MAX, 2).is_err());
        assert_eq!(r.read_bytes(3, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_string_index_zero_is_not_specified() {
        let data = [0x00];
        let s = strings();
        let r = FieldReader::new(&data, &s);
        let v = r.read_string(0).unwrap();
        assert_eq!(v, SmbiosString::NotSpecified);
        assert_eq!(v.to_string(), "Not Specified");
    }

    #[test]
    fn test_string_index_resolution() {
        let data = [0x02, 0x01, 0x03];
        let s = strings();
        let r = FieldReader::new(&data, &s);
        assert_eq!(r.read_string(0).unwrap(), SmbiosString::from("1.0"));
        assert_eq!(r.read_string(1).unwrap().as_str(), Some("Vendor"));
        assert_eq!(r.read_string(2), Err(Error::BadStringIndex { index: 3, count: 2 }));
    }

    #[test]
    fn test_writer_shares_string_indices() {
        let mut w = TableWriter::new();
        w.write_string(&SmbiosString::from("Acme")).unwrap();
        w.write_string(&SmbiosString::NotSpecified).unwrap();
        w.write_string(&SmbiosString::from("Board")).unwrap();
        w.write_string(&SmbiosString::from("Acme")).unwrap();
        w.write_string(&SmbiosString::from("")).unwrap();
        let raw = w.finish(TableType(2), 0x0200).unwrap();
        assert_eq!(raw.data(), &[1, 0, 2, 1, 0]);
        assert_eq!(raw.strings(), &[b"Acme".to_vec(), b"Board".to_vec()]);
        assert_eq!(raw.header().length, 9);
    }

    #[test]
    fn test_writer_rejects_bad_index() {
        let mut w = TableWriter::new();
        assert_eq!(
            w.write_string(&SmbiosString::BadIndex(9)),
            Err(Error::InvalidArgument("string has a bad index"))
        );
        assert!(w.is_empty());
    }

    #[test]
    fn test_writer_rejects_oversized_structure() {
        let mut w = TableWriter::new();
        w.write_zeros(MAX_STRUCTURE_LEN - Header::SIZE);
        let mut over = TableWriter::new();
        over.write_zeros(MAX_STRUCTURE_LEN - Header::SIZE + 1);
        assert_eq!(w.finish(TableType(0x80), 0).unwrap().len(), MAX_STRUCTURE_LEN);
        assert_eq!(
            over.finish(TableType(0x80), 0),
            Err(Error::InvalidArgument("structure too long"))
        );
    }
}
