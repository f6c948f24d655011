//! SMBIOS entry point.
//!
//! Two layouts exist: the 31-byte 32-bit entry point (`_SM_`, SMBIOS 2.x)
//! with its embedded `_DMI_` intermediate area, and the 24-byte 64-bit entry
//! point (`_SM3_`, SMBIOS 3.x). Both are validated on parse and get fresh
//! checksums on every serialize.

use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};

// =============================================================================
// ANCHORS
// =============================================================================

/// SMBIOS 2.x anchor string
pub const SMBIOS2_ANCHOR: [u8; 4] = *b"_SM_";

/// SMBIOS 3.x anchor string
pub const SMBIOS3_ANCHOR: [u8; 5] = *b"_SM3_";

/// Intermediate anchor inside the 32-bit entry point
pub const DMI_ANCHOR: [u8; 5] = *b"_DMI_";

/// Bytes needed to tell the two variants apart
const PEEK_LEN: usize = 5;

/// Value that makes `data` (excluding `skip`) sum to zero.
fn checksum(data: &[u8], skip: usize) -> u8 {
    let sum = data
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != skip)
        .fold(0u8, |acc, (_, &b)| acc.wrapping_add(b));
    0u8.wrapping_sub(sum)
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn le_u64(bytes: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(b)
}

fn five(bytes: &[u8]) -> [u8; 5] {
    let mut out = [0u8; 5];
    let n = bytes.len().min(5);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

// =============================================================================
// VERSION
// =============================================================================

/// Specification version announced by an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SmbiosVersion {
    pub major: u8,
    pub minor: u8,
    /// Document revision (64-bit entry point only, 0 otherwise)
    pub revision: u8,
}

impl fmt::Display for SmbiosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.revision)
    }
}

// =============================================================================
// 32-BIT ENTRY POINT
// =============================================================================

/// SMBIOS 2.x entry point (32-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry32 {
    /// Checksum as read (recomputed on serialize)
    pub checksum: u8,
    /// Entry point length
    pub length: u8,
    /// Major version
    pub major_version: u8,
    /// Minor version
    pub minor_version: u8,
    /// Maximum structure size
    pub max_structure_size: u16,
    /// Entry point revision
    pub entry_point_revision: u8,
    /// Formatted area
    pub formatted_area: [u8; 5],
    /// Intermediate checksum as read (recomputed on serialize)
    pub intermediate_checksum: u8,
    /// Structure table length
    pub structure_table_length: u16,
    /// Structure table address
    pub structure_table_address: u32,
    /// Number of structures
    pub number_of_structures: u16,
    /// BCD revision
    pub bcd_revision: u8,
}

impl Entry32 {
    /// Size
    pub const SIZE: usize = 0x1f;

    const CHECKSUM_AT: usize = 0x04;
    const INTERMEDIATE_AT: usize = 0x10;
    /// Intermediate checksum offset, relative to the intermediate area
    const INTERMEDIATE_CHECKSUM_AT: usize = 0x05;

    /// Parse and validate from bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::UnexpectedEndOfData {
                context: "32-bit entry point",
                offset: bytes.len(),
            });
        }
        let bytes = &bytes[..Self::SIZE];

        if bytes[..4] != SMBIOS2_ANCHOR {
            return Err(Error::InvalidAnchor { found: five(bytes) });
        }

        let entry = Self {
            checksum: bytes[4],
            length: bytes[5],
            major_version: bytes[6],
            minor_version: bytes[7],
            max_structure_size: le_u16(bytes, 8),
            entry_point_revision: bytes[10],
            formatted_area: five(&bytes[11..16]),
            intermediate_checksum: bytes[0x15],
            structure_table_length: le_u16(bytes, 0x16),
            structure_table_address: le_u32(bytes, 0x18),
            number_of_structures: le_u16(bytes, 0x1c),
            bcd_revision: bytes[0x1e],
        };

        if usize::from(entry.length) != Self::SIZE {
            return Err(Error::LengthMismatch { expected: Self::SIZE as u8, found: entry.length });
        }
        let expected = checksum(bytes, Self::CHECKSUM_AT);
        if entry.checksum != expected {
            return Err(Error::ChecksumMismatch { expected, found: entry.checksum });
        }
        let intermediate = &bytes[Self::INTERMEDIATE_AT..];
        if intermediate[..5] != DMI_ANCHOR {
            return Err(Error::InvalidIntermediateAnchor { found: five(intermediate) });
        }
        let expected = checksum(intermediate, Self::INTERMEDIATE_CHECKSUM_AT);
        if entry.intermediate_checksum != expected {
            return Err(Error::IntermediateChecksumMismatch {
                expected,
                found: entry.intermediate_checksum,
            });
        }

        Ok(entry)
    }

    /// Serialize, recomputing the intermediate checksum then the primary one.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::SIZE);
        data.extend_from_slice(&SMBIOS2_ANCHOR);
        data.push(self.checksum);
        data.push(self.length);
        data.push(self.major_version);
        data.push(self.minor_version);
        data.extend_from_slice(&self.max_structure_size.to_le_bytes());
        data.push(self.entry_point_revision);
        data.extend_from_slice(&self.formatted_area);
        data.extend_from_slice(&DMI_ANCHOR);
        data.push(self.intermediate_checksum);
        data.extend_from_slice(&self.structure_table_length.to_le_bytes());
        data.extend_from_slice(&self.structure_table_address.to_le_bytes());
        data.extend_from_slice(&self.number_of_structures.to_le_bytes());
        data.push(self.bcd_revision);

        let at = Self::INTERMEDIATE_AT + Self::INTERMEDIATE_CHECKSUM_AT;
        data[at] = checksum(&data[Self::INTERMEDIATE_AT..], Self::INTERMEDIATE_CHECKSUM_AT);
        data[Self::CHECKSUM_AT] = checksum(&data, Self::CHECKSUM_AT);
        data
    }
}

impl fmt::Display for Entry32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMBIOS {}.{}", self.major_version, self.minor_version)
    }
}

// =============================================================================
// 64-BIT ENTRY POINT
// =============================================================================

/// SMBIOS 3.x entry point (64-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry64 {
    /// Checksum as read (recomputed on serialize)
    pub checksum: u8,
    /// Entry point length
    pub length: u8,
    /// Major version
    pub major_version: u8,
    /// Minor version
    pub minor_version: u8,
    /// Docrev
    pub docrev: u8,
    /// Entry point revision
    pub entry_point_revision: u8,
    /// Reserved
    pub reserved: u8,
    /// Maximum structure table size
    pub structure_table_max_size: u32,
    /// Structure table address
    pub structure_table_address: u64,
}

impl Entry64 {
    /// Size
    pub const SIZE: usize = 0x18;

    const CHECKSUM_AT: usize = 0x05;

    /// Parse and validate from bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(Error::UnexpectedEndOfData {
                context: "64-bit entry point",
                offset: bytes.len(),
            });
        }
        let bytes = &bytes[..Self::SIZE];

        if bytes[..5] != SMBIOS3_ANCHOR {
            return Err(Error::InvalidAnchor { found: five(bytes) });
        }

        let entry = Self {
            checksum: bytes[5],
            length: bytes[6],
            major_version: bytes[7],
            minor_version: bytes[8],
            docrev: bytes[9],
            entry_point_revision: bytes[10],
            reserved: bytes[11],
            structure_table_max_size: le_u32(bytes, 12),
            structure_table_address: le_u64(bytes, 16),
        };

        if usize::from(entry.length) != Self::SIZE {
            return Err(Error::LengthMismatch { expected: Self::SIZE as u8, found: entry.length });
        }
        let expected = checksum(bytes, Self::CHECKSUM_AT);
        if entry.checksum != expected {
            return Err(Error::ChecksumMismatch { expected, found: entry.checksum });
        }

        Ok(entry)
    }

    /// Serialize with a freshly computed checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::SIZE);
        data.extend_from_slice(&SMBIOS3_ANCHOR);
        data.push(self.checksum);
        data.push(self.length);
        data.push(self.major_version);
        data.push(self.minor_version);
        data.push(self.docrev);
        data.push(self.entry_point_revision);
        data.push(self.reserved);
        data.extend_from_slice(&self.structure_table_max_size.to_le_bytes());
        data.extend_from_slice(&self.structure_table_address.to_le_bytes());

        data[Self::CHECKSUM_AT] = checksum(&data, Self::CHECKSUM_AT);
        data
    }
}

impl fmt::Display for Entry64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SMBIOS {}.{}.{}", self.major_version, self.minor_version, self.docrev)
    }
}

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Either entry point variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Bits32(Entry32),
    Bits64(Entry64),
}

impl EntryPoint {
    /// Parse the entry point at the start of `bytes`, choosing the variant
    /// by its anchor.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PEEK_LEN {
            return Err(Error::UnexpectedEndOfData { context: "entry point anchor", offset: bytes.len() });
        }
        if bytes[..4] == SMBIOS2_ANCHOR {
            Entry32::parse(bytes).map(Self::Bits32)
        } else if bytes[..5] == SMBIOS3_ANCHOR {
            Entry64::parse(bytes).map(Self::Bits64)
        } else {
            Err(Error::InvalidAnchor { found: five(bytes) })
        }
    }

    /// Serialized size of this variant.
    pub fn size(&self) -> usize {
        match self {
            Self::Bits32(_) => Entry32::SIZE,
            Self::Bits64(_) => Entry64::SIZE,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bits32(e) => e.to_bytes(),
            Self::Bits64(e) => e.to_bytes(),
        }
    }

    /// Physical address of the structure table and its size.
    ///
    /// For the 64-bit variant the size is the declared maximum.
    pub fn table(&self) -> (u64, usize) {
        match self {
            Self::Bits32(e) => (
                u64::from(e.structure_table_address),
                usize::from(e.structure_table_length),
            ),
            Self::Bits64(e) => (e.structure_table_address, e.structure_table_max_size as usize),
        }
    }

    pub fn version(&self) -> SmbiosVersion {
        match self {
            Self::Bits32(e) => SmbiosVersion {
                major: e.major_version,
                minor: e.minor_version,
                revision: 0,
            },
            Self::Bits64(e) => SmbiosVersion {
                major: e.major_version,
                minor: e.minor_version,
                revision: e.docrev,
            },
        }
    }

    /// Point the entry at a new table address.
    ///
    /// Fails on the 32-bit variant when the address does not fit 32 bits.
    pub fn set_table_address(&mut self, address: u64) -> Result<()> {
        match self {
            Self::Bits32(e) => {
                e.structure_table_address = u32::try_from(address)
                    .map_err(|_| Error::InvalidArgument("table address exceeds 32 bits"))?;
            }
            Self::Bits64(e) => e.structure_table_address = address,
        }
        Ok(())
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits32(e) => fmt::Display::fmt(e, f),
            Self::Bits64(e) => fmt::Display::fmt(e, f),
        }
    }
}
