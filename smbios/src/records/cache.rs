//! Cache Information (Type 7)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{write_flag_lines, ByteSize, Lookup};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

bitflags! {
    /// SRAM type word (offsets 0Bh and 0Dh)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CacheSramTypes: u16 {
        const OTHER = 1 << 0;
        const UNKNOWN = 1 << 1;
        const NON_BURST = 1 << 2;
        const BURST = 1 << 3;
        const PIPELINE_BURST = 1 << 4;
        const SYNCHRONOUS = 1 << 5;
        const ASYNCHRONOUS = 1 << 6;
    }
}

const SRAM_TYPES: &[(CacheSramTypes, &str)] = &[
    (CacheSramTypes::OTHER, "Other"),
    (CacheSramTypes::UNKNOWN, "Unknown"),
    (CacheSramTypes::NON_BURST, "Non-Burst"),
    (CacheSramTypes::BURST, "Burst"),
    (CacheSramTypes::PIPELINE_BURST, "Pipeline Burst"),
    (CacheSramTypes::SYNCHRONOUS, "Synchronous"),
    (CacheSramTypes::ASYNCHRONOUS, "Asynchronous"),
];

const ERROR_CORRECTION: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "None"),
    (0x04, "Parity"),
    (0x05, "Single-bit ECC"),
    (0x06, "Multi-bit ECC"),
];

const SYSTEM_TYPES: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "Instruction"),
    (0x04, "Data"),
    (0x05, "Unified"),
];

const ASSOCIATIVITY: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "Direct Mapped"),
    (0x04, "2-way Set-associative"),
    (0x05, "4-way Set-associative"),
    (0x06, "Fully Associative"),
    (0x07, "8-way Set-associative"),
    (0x08, "16-way Set-associative"),
    (0x09, "12-way Set-associative"),
    (0x0a, "24-way Set-associative"),
    (0x0b, "32-way Set-associative"),
    (0x0c, "48-way Set-associative"),
    (0x0d, "64-way Set-associative"),
    (0x0e, "20-way Set-associative"),
];

/// Size in bytes from the 16-bit and 32-bit size fields.
///
/// The 32-bit field wins when non-zero. In both, the top bit selects 64K
/// granularity instead of 1K.
fn size_bytes(size1: u16, size2: u32) -> u64 {
    let unit2 = if size2 & 0x8000_0000 != 0 { 64 * 1024 } else { 1024 };
    let bytes2 = u64::from(size2 & 0x7fff_ffff) * unit2;
    if bytes2 != 0 {
        return bytes2;
    }
    let unit1 = if size1 & 0x8000 != 0 { 64 * 1024 } else { 1024 };
    u64::from(size1 & 0x7fff) * unit1
}

/// Cache Information (Type 7)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheInfo {
    pub table: RawStructure,
    pub socket_designation: SmbiosString,
    /// Level, socketed, location, enabled and mode bits
    pub configuration: u16,
    pub maximum_size: u16,
    pub installed_size: u16,
    pub supported_sram_type: CacheSramTypes,
    pub current_sram_type: CacheSramTypes,
    /// Nanoseconds, 0 if unknown
    pub speed: u8,
    pub error_correction_type: u8,
    pub system_type: u8,
    pub associativity: u8,
    pub maximum_size2: u32,
    pub installed_size2: u32,
}

impl CacheInfo {
    pub fn max_size_bytes(&self) -> u64 {
        size_bytes(self.maximum_size, self.maximum_size2)
    }

    pub fn installed_size_bytes(&self) -> u64 {
        size_bytes(self.installed_size, self.installed_size2)
    }

    /// Cache level, 1-based.
    pub fn level(&self) -> u8 {
        (self.configuration & 0x07) as u8 + 1
    }

    pub fn enabled(&self) -> bool {
        self.configuration & 0x80 != 0
    }

    pub fn socketed(&self) -> bool {
        self.configuration & 0x08 != 0
    }
}

impl Record for CacheInfo {
    const TABLE_TYPE: TableType = TableType::CACHE_INFORMATION;
    const NAME: &'static str = "CacheInfo";
    const MIN_LEN: usize = 0x0f;
    const FIELDS: &'static [F] = &[
        F::string("SocketDesignation"),
        F::u16("Configuration"),
        F::u16("MaximumSize"),
        F::u16("InstalledSize"),
        F::u16("SupportedSRAMType"),
        F::u16("CurrentSRAMType"),
        F::u8("Speed"),
        F::u8("ErrorCorrectionType"),
        F::u8("SystemType"),
        F::u8("Associativity"),
        F::u32("MaximumSize2"),
        F::u32("InstalledSize2"),
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            socket_designation: f.string()?,
            configuration: f.u16()?,
            maximum_size: f.u16()?,
            installed_size: f.u16()?,
            supported_sram_type: CacheSramTypes::from_bits_retain(f.u16()?),
            current_sram_type: CacheSramTypes::from_bits_retain(f.u16()?),
            speed: f.u8()?,
            error_correction_type: f.u8()?,
            system_type: f.u8()?,
            associativity: f.u8()?,
            maximum_size2: f.u32()?,
            installed_size2: f.u32()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.socket_designation.clone()),
            FieldValue::U16(self.configuration),
            FieldValue::U16(self.maximum_size),
            FieldValue::U16(self.installed_size),
            FieldValue::U16(self.supported_sram_type.bits()),
            FieldValue::U16(self.current_sram_type.bits()),
            FieldValue::U8(self.speed),
            FieldValue::U8(self.error_correction_type),
            FieldValue::U8(self.system_type),
            FieldValue::U8(self.associativity),
            FieldValue::U32(self.maximum_size2),
            FieldValue::U32(self.installed_size2),
        ]
    }
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match (self.configuration >> 8) & 0x03 {
            0 => "Write Through",
            1 => "Write Back",
            2 => "Varies With Memory Address",
            _ => "Unknown",
        };
        let location = match (self.configuration >> 5) & 0x03 {
            0 => "Internal",
            1 => "External",
            2 => "Reserved",
            _ => "Unknown",
        };

        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tSocket Designation: {}", self.socket_designation)?;
        write!(
            f,
            "\n\tConfiguration: {}, {}, Level {}",
            if self.enabled() { "Enabled" } else { "Disabled" },
            if self.socketed() { "Socketed" } else { "Not Socketed" },
            self.level()
        )?;
        write!(f, "\n\tOperational Mode: {}", mode)?;
        write!(f, "\n\tLocation: {}", location)?;
        write!(f, "\n\tInstalled Size: {}", ByteSize(self.installed_size_bytes()))?;
        write!(f, "\n\tMaximum Size: {}", ByteSize(self.max_size_bytes()))?;
        write!(f, "\n\tSupported SRAM Types:")?;
        write_flag_lines(f, self.supported_sram_type, SRAM_TYPES)?;
        write!(f, "\n\tInstalled SRAM Type:")?;
        for (flag, name) in SRAM_TYPES {
            if self.current_sram_type.contains(*flag) {
                write!(f, " {}", name)?;
            }
        }
        if self.table.header().length > 0x0f {
            match self.speed {
                0 => write!(f, "\n\tSpeed: Unknown")?,
                ns => write!(f, "\n\tSpeed: {} ns", ns)?,
            }
            write!(
                f,
                "\n\tError Correction Type: {}",
                Lookup { value: self.error_correction_type, names: ERROR_CORRECTION }
            )?;
            write!(f, "\n\tSystem Type: {}", Lookup { value: self.system_type, names: SYSTEM_TYPES })?;
            write!(
                f,
                "\n\tAssociativity: {}",
                Lookup { value: self.associativity, names: ASSOCIATIVITY }
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::table::Header;

    const L2: [u8; 0x17] = [
        0x01, // socket designation
        0x81, 0x01, // enabled, write back, internal, level 2
        0x00, 0x02, // max 512K
        0x00, 0x02, // installed 512K
        0x20, 0x00, // synchronous
        0x20, 0x00, // synchronous
        0x00, // speed unknown
        0x05, // single-bit ECC
        0x05, // unified
        0x07, // 8-way
        0x00, 0x00, 0x00, 0x00, // max size2
        0x00, 0x00, 0x00, 0x00, // installed size2
    ];

    fn raw(data: &[u8]) -> RawStructure {
        RawStructure::new(
            Header {
                table_type: TableType::CACHE_INFORMATION,
                length: (data.len() + Header::SIZE) as u8,
                handle: 0x0011,
            },
            data.to_vec(),
            vec![b"L2 Cache".to_vec()],
        )
    }

    #[test]
    fn test_sizes() {
        assert_eq!(size_bytes(0x0200, 0), 512 * 1024);
        assert_eq!(size_bytes(0x8020, 0), 32 * 64 * 1024);
        assert_eq!(size_bytes(0x8000, 0x8000_0200), 512 * 64 * 1024);
        assert_eq!(size_bytes(0xffff, 0x0000_8000), 32 * 1024 * 1024);
    }

    #[test]
    fn test_parse_and_display() {
        let c = CacheInfo::parse(&raw(&L2), StringPolicy::Strict).unwrap();
        assert_eq!(c.level(), 2);
        assert!(c.enabled());
        assert!(!c.socketed());
        assert_eq!(c.installed_size_bytes(), 512 * 1024);

        let text = c.to_string();
        assert!(text.contains("\n\tConfiguration: Enabled, Not Socketed, Level 2"));
        assert!(text.contains("\n\tOperational Mode: Write Back\n\tLocation: Internal"));
        assert!(text.contains("\n\tInstalled Size: 512 kB"));
        assert!(text.contains("\n\tSupported SRAM Types:\n\t\tSynchronous\n\tInstalled SRAM Type: Synchronous"));
        assert!(text.ends_with(
            "\n\tSpeed: Unknown\n\tError Correction Type: Single-bit ECC\
             \n\tSystem Type: Unified\n\tAssociativity: 8-way Set-associative"
        ));
    }

    #[test]
    fn test_minimal_cache_omits_speed() {
        let c = CacheInfo::parse(&raw(&L2[..0x0b]), StringPolicy::Strict).unwrap();
        assert_eq!(c.associativity, 0);
        assert!(c.to_string().ends_with("\n\tInstalled SRAM Type: Synchronous"));
    }

    #[test]
    fn test_encode_round_trip() {
        let t = raw(&L2);
        let c = CacheInfo::parse(&t, StringPolicy::Strict).unwrap();
        assert_eq!(c.encode(0x0011).unwrap(), t);
    }
}
