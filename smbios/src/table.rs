//! Structure table stream.
//!
//! The table region is a concatenation of structures:
//!
//! ```text
//! +------+--------+--------+-------------------+------------------------+
//! | type | length | handle | formatted region  | "str1\0str2\0...\0"    |
//! |  u8  |   u8   |  u16   | length - 4 bytes  | or "\0\0" when empty   |
//! +------+--------+--------+-------------------+------------------------+
//! ```
//!
//! The reader never looks at the type code, so vendor types tokenize like
//! any other.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::cursor::{FieldReader, SmbiosString};
use crate::error::{Error, Result};

// =============================================================================
// TABLE TYPES
// =============================================================================

/// SMBIOS structure type code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableType(pub u8);

impl TableType {
    pub const BIOS_INFORMATION: Self = Self(0);
    pub const SYSTEM_INFORMATION: Self = Self(1);
    pub const BASEBOARD_INFORMATION: Self = Self(2);
    pub const CHASSIS_INFORMATION: Self = Self(3);
    pub const PROCESSOR_INFORMATION: Self = Self(4);
    pub const MEMORY_CONTROLLER: Self = Self(5);
    pub const MEMORY_MODULE: Self = Self(6);
    pub const CACHE_INFORMATION: Self = Self(7);
    pub const PORT_CONNECTOR: Self = Self(8);
    pub const SYSTEM_SLOTS: Self = Self(9);
    pub const ON_BOARD_DEVICES: Self = Self(10);
    pub const SYSTEM_CONFIG_OPTIONS: Self = Self(12);
    pub const BIOS_LANGUAGE: Self = Self(13);
    pub const SYSTEM_EVENT_LOG: Self = Self(15);
    pub const PHYSICAL_MEMORY_ARRAY: Self = Self(16);
    pub const MEMORY_DEVICE: Self = Self(17);
    pub const SYSTEM_RESET: Self = Self(23);
    pub const SYSTEM_BOOT_INFORMATION: Self = Self(32);
    pub const IPMI_DEVICE_INFORMATION: Self = Self(38);
    pub const ONBOARD_DEVICES_EXTENDED: Self = Self(41);
    pub const TPM_DEVICE: Self = Self(43);
    pub const INACTIVE: Self = Self(126);
    pub const END_OF_TABLE: Self = Self(127);

    /// First OEM-specific code
    pub const OEM_START: u8 = 0x80;

    pub fn name(self) -> &'static str {
        match self {
            Self::BIOS_INFORMATION => "BIOS Information",
            Self::SYSTEM_INFORMATION => "System Information",
            Self::BASEBOARD_INFORMATION => "Base Board Information",
            Self::CHASSIS_INFORMATION => "Chassis Information",
            Self::PROCESSOR_INFORMATION => "Processor Information",
            Self::CACHE_INFORMATION => "Cache Information",
            Self::SYSTEM_SLOTS => "System Slots",
            Self::MEMORY_DEVICE => "Memory Device",
            Self::IPMI_DEVICE_INFORMATION => "IPMI Device Information",
            Self::TPM_DEVICE => "TPM Device",
            Self::INACTIVE => "Inactive",
            Self::END_OF_TABLE => "End Of Table",
            Self(t) if t >= Self::OEM_START => "OEM-specific Type",
            _ => "Unsupported",
        }
    }
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<u8> for TableType {
    fn from(v: u8) -> Self {
        Self(v)
    }
}

// =============================================================================
// HEADER
// =============================================================================

/// Structure header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Header {
    /// Structure type
    pub table_type: TableType,
    /// Header plus formatted region length
    pub length: u8,
    /// Handle
    pub handle: u16,
}

impl Header {
    /// Size
    pub const SIZE: usize = 4;

    /// Parse from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            table_type: TableType(bytes[0]),
            length: bytes[1],
            handle: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let [lo, hi] = self.handle.to_le_bytes();
        [self.table_type.0, self.length, lo, hi]
    }

    /// Formatted region length implied by `length`.
    pub fn formatted_len(&self) -> usize {
        usize::from(self.length).saturating_sub(Self::SIZE)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle 0x{:04X}, DMI type {}, {} bytes\n{}",
            self.handle, self.table_type.0, self.length, self.table_type
        )
    }
}

// =============================================================================
// RAW STRUCTURE
// =============================================================================

/// One undecoded structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStructure {
    header: Header,
    data: Vec<u8>,
    strings: Vec<Vec<u8>>,
}

impl RawStructure {
    pub fn new(header: Header, data: Vec<u8>, strings: Vec<Vec<u8>>) -> Self {
        Self { header, data, strings }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn table_type(&self) -> TableType {
        self.header.table_type
    }

    pub fn handle(&self) -> u16 {
        self.header.handle
    }

    /// Formatted region.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// String section entries as stored, without their NUL terminators.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Header plus formatted region length, as actually present.
    pub fn len(&self) -> usize {
        self.data.len() + Header::SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.data, &self.strings)
    }

    pub fn get_u8(&self, offset: usize) -> Result<u8> {
        self.reader().read_u8(offset)
    }

    pub fn get_u16(&self, offset: usize) -> Result<u16> {
        self.reader().read_u16(offset)
    }

    pub fn get_u32(&self, offset: usize) -> Result<u32> {
        self.reader().read_u32(offset)
    }

    pub fn get_u64(&self, offset: usize) -> Result<u64> {
        self.reader().read_u64(offset)
    }

    pub fn get_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.reader().read_bytes(offset, len)
    }

    /// String referenced by the index byte at `offset`.
    pub fn get_string(&self, offset: usize) -> Result<SmbiosString> {
        self.reader().read_string(offset)
    }

    /// Append the encoded structure to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.data);
        if self.strings.is_empty() {
            out.extend_from_slice(&[0, 0]);
            return;
        }
        for s in &self.strings {
            out.extend_from_slice(s);
            out.push(0);
        }
        out.push(0);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

impl fmt::Display for RawStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        write!(f, "\tHeader and Data:")?;
        let header = self.header.to_bytes();
        let bytes: Vec<u8> = header.iter().chain(self.data.iter()).copied().collect();
        for row in bytes.chunks(16) {
            write!(f, "\n\t\t")?;
            for (i, b) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:02X}", b)?;
            }
        }
        if !self.strings.is_empty() {
            write!(f, "\n\tStrings:")?;
            for s in &self.strings {
                write!(f, "\n\t\t{}", String::from_utf8_lossy(s))?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// STREAM READER
// =============================================================================

/// Iterator splitting a table blob into structures.
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug, Clone)]
pub struct TableReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> TableReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0, done: false }
    }

    /// Offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        let rest = &self.bytes[self.offset..];
        if rest.len() < n {
            return Err(Error::UnexpectedEndOfData { context, offset: self.bytes.len() });
        }
        self.offset += n;
        Ok(&rest[..n])
    }

    fn read_strings(&mut self) -> Result<Vec<Vec<u8>>> {
        const CONTEXT: &str = "string section";

        let rest = &self.bytes[self.offset..];
        if rest.len() < 2 {
            return Err(Error::UnexpectedEndOfData { context: CONTEXT, offset: self.bytes.len() });
        }
        if rest[..2] == [0, 0] {
            self.offset += 2;
            return Ok(Vec::new());
        }

        let mut strings = Vec::new();
        loop {
            let rest = &self.bytes[self.offset..];
            let nul = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or(Error::UnexpectedEndOfData { context: CONTEXT, offset: self.bytes.len() })?;
            strings.push(rest[..nul].to_vec());
            self.offset += nul + 1;

            match self.bytes.get(self.offset) {
                None => {
                    return Err(Error::UnexpectedEndOfData {
                        context: CONTEXT,
                        offset: self.bytes.len(),
                    })
                }
                Some(0) => {
                    self.offset += 1;
                    return Ok(strings);
                }
                Some(_) => {}
            }
        }
    }

    fn read_structure(&mut self) -> Result<RawStructure> {
        let start = self.offset;
        let header = self
            .take(Header::SIZE, "structure header")
            .map(Header::from_bytes)?
            .ok_or(Error::UnexpectedEndOfData { context: "structure header", offset: start })?;
        log::trace!("{:#06x}: type {} length {} handle {:#06x}", start, header.table_type.0, header.length, header.handle);

        if usize::from(header.length) < Header::SIZE {
            log::warn!(
                "structure at {:#x} declares length {}, shorter than its header",
                start,
                header.length
            );
        }
        let data = self.take(header.formatted_len(), "formatted section")?.to_vec();
        let strings = self.read_strings()?;
        Ok(RawStructure::new(header, data, strings))
    }
}

impl Iterator for TableReader<'_> {
    type Item = Result<RawStructure>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.bytes.len() {
            return None;
        }
        let item = self.read_structure();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

// =============================================================================
// TABLE COLLECTION
// =============================================================================

/// Structures in stream order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tables(Vec<RawStructure>);

impl Tables {
    /// Split a whole table region. Any framing error aborts the parse.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let tables = TableReader::new(bytes).collect::<Result<Vec<_>>>()?;
        log::debug!("parsed {} structures from {} bytes", tables.len(), bytes.len());
        Ok(Self(tables))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, RawStructure> {
        self.0.iter()
    }

    /// All structures of a type.
    pub fn by_type(&self, table_type: TableType) -> impl Iterator<Item = &RawStructure> + '_ {
        self.0.iter().filter(move |t| t.table_type() == table_type)
    }

    /// First structure of a type.
    pub fn first_of_type(&self, table_type: TableType) -> Option<&RawStructure> {
        self.0.iter().find(|t| t.table_type() == table_type)
    }

    /// Re-encode every structure in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for t in &self.0 {
            t.write_to(&mut out);
        }
        out
    }
}

impl From<Vec<RawStructure>> for Tables {
    fn from(v: Vec<RawStructure>) -> Self {
        Self(v)
    }
}

impl FromIterator<RawStructure> for Tables {
    fn from_iter<I: IntoIterator<Item = RawStructure>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tables {
    type Item = RawStructure;
    type IntoIter = alloc::vec::IntoIter<RawStructure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tables {
    type Item = &'a RawStructure;
    type IntoIter = core::slice::Iter<'a, RawStructure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// BIOS (type 0) with two strings followed by an empty End Of Table.
    const STREAM: [u8; 37] = [
        0x00, 0x12, 0x00, 0x00, // header
        0x01, 0x02, 0x00, 0xf0, 0x03, 0x0f, // vendor, version, segment, date, rom
        0x80, 0x98, 0x0b, 0x00, 0x00, 0x00, 0x00, 0x00, // characteristics
        b'A', b'c', b'm', b'e', 0x00, b'1', b'.', b'0', 0x00, 0x00, // strings
        0x7f, 0x04, 0x01, 0x00, 0x00, 0x00, // end of table
        0x00, 0x00, 0x00, // unreachable tail is a truncated header
    ];

    #[test]
    fn test_empty_structure_round_trip() {
        let bytes = [0x01, 0x04, 0x00, 0x00, 0x00, 0x00];
        let tables = Tables::parse(&bytes).unwrap();
        assert_eq!(tables.len(), 1);
        let t = tables.first_of_type(TableType::SYSTEM_INFORMATION).unwrap();
        assert!(t.data().is_empty());
        assert!(t.strings().is_empty());
        assert_eq!(t.len(), 4);
        assert_eq!(tables.to_bytes(), bytes);
    }

    #[test]
    fn test_stream_with_strings() {
        let bytes = &STREAM[..34];
        let tables = Tables::parse(bytes).unwrap();
        assert_eq!(tables.len(), 2);

        let bios = tables.first_of_type(TableType::BIOS_INFORMATION).unwrap();
        assert_eq!(bios.len(), 0x12);
        assert_eq!(bios.strings(), &[b"Acme".to_vec(), b"1.0".to_vec()]);
        assert_eq!(bios.get_u16(2).unwrap(), 0xf000);
        assert_eq!(bios.get_string(1).unwrap().to_string(), "1.0");
        assert_eq!(tables.by_type(TableType::END_OF_TABLE).count(), 1);
        assert_eq!(tables.to_bytes(), bytes);
    }

    #[test]
    fn test_latin1_string_round_trip() {
        let bytes = [0x80, 0x05, 0x00, 0x00, 0x01, b'C', b'a', b'f', 0xe9, 0x00, 0x00];
        let tables = Tables::parse(&bytes).unwrap();
        let oem = tables.first_of_type(TableType(0x80)).unwrap();
        assert_eq!(oem.strings(), &[vec![b'C', b'a', b'f', 0xe9]]);
        assert_eq!(oem.get_string(0).unwrap().as_str(), Some("Caf\u{fffd}"));
        assert!(oem.to_string().ends_with("\n\tStrings:\n\t\tCaf\u{fffd}"));
        assert_eq!(tables.to_bytes(), bytes);
    }

    #[test]
    fn test_truncation_mid_structure_fails() {
        assert!(matches!(
            Tables::parse(&STREAM),
            Err(Error::UnexpectedEndOfData { context: "structure header", .. })
        ));
        assert!(matches!(
            Tables::parse(&STREAM[..10]),
            Err(Error::UnexpectedEndOfData { context: "formatted section", .. })
        ));
        assert!(matches!(
            Tables::parse(&STREAM[..21]),
            Err(Error::UnexpectedEndOfData { context: "string section", .. })
        ));
        assert!(matches!(
            Tables::parse(&STREAM[..27]),
            Err(Error::UnexpectedEndOfData { context: "string section", .. })
        ));
    }

    #[test]
    fn test_reader_stops_after_error() {
        let mut reader = TableReader::new(&STREAM);
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_unknown_types_tokenize() {
        let bytes = [
            0xc8, 0x06, 0x34, 0x12, 0xaa, 0xbb, b'x', 0x00, 0x00, // OEM type
            0x55, 0x05, 0x01, 0x00, 0xcc, 0x00, 0x00, // unassigned type
        ];
        let tables = Tables::parse(&bytes).unwrap();
        let types: Vec<_> = tables.iter().map(|t| t.table_type()).collect();
        assert_eq!(types, vec![TableType(0xc8), TableType(0x55)]);
        assert_eq!(tables.iter().next().unwrap().handle(), 0x1234);
        assert_eq!(TableType(0xc8).name(), "OEM-specific Type");
        assert_eq!(TableType(0x55).name(), "Unsupported");
    }

    #[test]
    fn test_short_length_is_tolerated() {
        let bytes = [0x05, 0x02, 0x00, 0x00, 0x00, 0x00];
        let tables = Tables::parse(&bytes).unwrap();
        let t = tables.iter().next().unwrap();
        assert_eq!(t.header().length, 2);
        assert!(t.data().is_empty());
        assert_eq!(tables.to_bytes(), bytes);
    }

    #[test]
    fn test_display() {
        let tables = Tables::parse(&STREAM[..34]).unwrap();
        let eot = tables.first_of_type(TableType::END_OF_TABLE).unwrap();
        assert_eq!(
            eot.to_string(),
            "Handle 0x0001, DMI type 127, 4 bytes\nEnd Of Table\n\tHeader and Data:\n\t\t7F 04 01 00"
        );
        let bios = tables.first_of_type(TableType::BIOS_INFORMATION).unwrap();
        assert!(bios.to_string().ends_with("\n\tStrings:\n\t\tAcme\n\t\t1.0"));
    }
}
