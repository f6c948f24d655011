//! BIOS Information (Type 0)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{write_flag_lines, ByteSize};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

bitflags! {
    /// BIOS characteristics (offset 0Ah)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct BiosCharacteristics: u64 {
        const RESERVED = 1 << 0;
        const RESERVED2 = 1 << 1;
        const UNKNOWN = 1 << 2;
        const NOT_SUPPORTED = 1 << 3;
        const ISA = 1 << 4;
        const MCA = 1 << 5;
        const EISA = 1 << 6;
        const PCI = 1 << 7;
        const PCMCIA = 1 << 8;
        const PNP = 1 << 9;
        const APM = 1 << 10;
        const UPGRADEABLE = 1 << 11;
        const SHADOWING = 1 << 12;
        const VL_VESA = 1 << 13;
        const ESCD = 1 << 14;
        const BOOT_FROM_CD = 1 << 15;
        const SELECTABLE_BOOT = 1 << 16;
        const ROM_SOCKETED = 1 << 17;
        const BOOT_FROM_PCMCIA = 1 << 18;
        const EDD = 1 << 19;
        const FLOPPY_NEC_9800 = 1 << 20;
        const FLOPPY_TOSHIBA = 1 << 21;
        const FLOPPY_360K = 1 << 22;
        const FLOPPY_1_2M = 1 << 23;
        const FLOPPY_720K = 1 << 24;
        const FLOPPY_2_88M = 1 << 25;
        const PRINT_SCREEN = 1 << 26;
        const KEYBOARD_8042 = 1 << 27;
        const SERIAL_SERVICES = 1 << 28;
        const PRINTER_SERVICES = 1 << 29;
        const CGA_MONO_VIDEO = 1 << 30;
        const NEC_PC98 = 1 << 31;
    }
}

bitflags! {
    /// BIOS characteristics extension byte 1 (offset 12h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct BiosCharacteristicsExt1: u8 {
        const ACPI = 1 << 0;
        const USB_LEGACY = 1 << 1;
        const AGP = 1 << 2;
        const I2O_BOOT = 1 << 3;
        const LS120_BOOT = 1 << 4;
        const ATAPI_ZIP_BOOT = 1 << 5;
        const IEEE_1394_BOOT = 1 << 6;
        const SMART_BATTERY = 1 << 7;
    }
}

bitflags! {
    /// BIOS characteristics extension byte 2 (offset 13h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct BiosCharacteristicsExt2: u8 {
        const BIOS_BOOT_SPEC = 1 << 0;
        const NETWORK_BOOT_KEY = 1 << 1;
        const TARGETED_CONTENT = 1 << 2;
        const UEFI = 1 << 3;
        const VIRTUAL_MACHINE = 1 << 4;
    }
}

const CHARACTERISTICS: &[(BiosCharacteristics, &str)] = &[
    (BiosCharacteristics::RESERVED, "Reserved"),
    (BiosCharacteristics::RESERVED2, "Reserved"),
    (BiosCharacteristics::UNKNOWN, "Unknown"),
    (BiosCharacteristics::NOT_SUPPORTED, "BIOS characteristics not supported"),
    (BiosCharacteristics::ISA, "ISA is supported"),
    (BiosCharacteristics::MCA, "MCA is supported"),
    (BiosCharacteristics::EISA, "EISA is supported"),
    (BiosCharacteristics::PCI, "PCI is supported"),
    (BiosCharacteristics::PCMCIA, "PC Card (PCMCIA) is supported"),
    (BiosCharacteristics::PNP, "PNP is supported"),
    (BiosCharacteristics::APM, "APM is supported"),
    (BiosCharacteristics::UPGRADEABLE, "BIOS is upgradeable"),
    (BiosCharacteristics::SHADOWING, "BIOS shadowing is allowed"),
    (BiosCharacteristics::VL_VESA, "VLB is supported"),
    (BiosCharacteristics::ESCD, "ESCD support is available"),
    (BiosCharacteristics::BOOT_FROM_CD, "Boot from CD is supported"),
    (BiosCharacteristics::SELECTABLE_BOOT, "Selectable boot is supported"),
    (BiosCharacteristics::ROM_SOCKETED, "BIOS ROM is socketed"),
    (BiosCharacteristics::BOOT_FROM_PCMCIA, "Boot from PC Card (PCMCIA) is supported"),
    (BiosCharacteristics::EDD, "EDD is supported"),
    (BiosCharacteristics::FLOPPY_NEC_9800, "Japanese floppy for NEC 9800 1.2 MB is supported (int 13h)"),
    (BiosCharacteristics::FLOPPY_TOSHIBA, "Japanese floppy for Toshiba 1.2 MB is supported (int 13h)"),
    (BiosCharacteristics::FLOPPY_360K, "5.25\"/360 kB floppy services are supported (int 13h)"),
    (BiosCharacteristics::FLOPPY_1_2M, "5.25\"/1.2 MB floppy services are supported (int 13h)"),
    (BiosCharacteristics::FLOPPY_720K, "3.5\"/720 kB floppy services are supported (int 13h)"),
    (BiosCharacteristics::FLOPPY_2_88M, "3.5\"/2.88 MB floppy services are supported (int 13h)"),
    (BiosCharacteristics::PRINT_SCREEN, "Print screen service is supported (int 5h)"),
    (BiosCharacteristics::KEYBOARD_8042, "8042 keyboard services are supported (int 9h)"),
    (BiosCharacteristics::SERIAL_SERVICES, "Serial services are supported (int 14h)"),
    (BiosCharacteristics::PRINTER_SERVICES, "Printer services are supported (int 17h)"),
    (BiosCharacteristics::CGA_MONO_VIDEO, "CGA/mono video services are supported (int 10h)"),
    (BiosCharacteristics::NEC_PC98, "NEC PC-98"),
];

const CHARACTERISTICS_EXT1: &[(BiosCharacteristicsExt1, &str)] = &[
    (BiosCharacteristicsExt1::ACPI, "ACPI is supported"),
    (BiosCharacteristicsExt1::USB_LEGACY, "USB legacy is supported"),
    (BiosCharacteristicsExt1::AGP, "AGP is supported"),
    (BiosCharacteristicsExt1::I2O_BOOT, "I2O boot is supported"),
    (BiosCharacteristicsExt1::LS120_BOOT, "LS-120 boot is supported"),
    (BiosCharacteristicsExt1::ATAPI_ZIP_BOOT, "ATAPI Zip drive boot is supported"),
    (BiosCharacteristicsExt1::IEEE_1394_BOOT, "IEEE 1394 boot is supported"),
    (BiosCharacteristicsExt1::SMART_BATTERY, "Smart battery is supported"),
];

const CHARACTERISTICS_EXT2: &[(BiosCharacteristicsExt2, &str)] = &[
    (BiosCharacteristicsExt2::BIOS_BOOT_SPEC, "BIOS boot specification is supported"),
    (BiosCharacteristicsExt2::NETWORK_BOOT_KEY, "Function key-initiated network boot is supported"),
    (BiosCharacteristicsExt2::TARGETED_CONTENT, "Targeted content distribution is supported"),
    (BiosCharacteristicsExt2::UEFI, "UEFI is supported"),
    (BiosCharacteristicsExt2::VIRTUAL_MACHINE, "System is a virtual machine"),
];

/// BIOS Information (Type 0)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiosInfo {
    /// Structure this record was decoded from
    pub table: RawStructure,
    pub vendor: SmbiosString,
    pub version: SmbiosString,
    pub starting_address_segment: u16,
    pub release_date: SmbiosString,
    /// ROM size in 64K units, minus one
    pub rom_size: u8,
    pub characteristics: BiosCharacteristics,
    pub characteristics_ext1: BiosCharacteristicsExt1,
    pub characteristics_ext2: BiosCharacteristicsExt2,
    pub bios_major: u8,
    pub bios_minor: u8,
    pub ec_major: u8,
    pub ec_minor: u8,
    pub extended_rom_size: u16,
}

impl BiosInfo {
    /// ROM size in bytes.
    ///
    /// `rom_size == 0xFF` defers to the extended size, whose bits 15:14
    /// select MiB (0) or GiB (1) units.
    pub fn rom_size_bytes(&self) -> u64 {
        if self.rom_size != 0xff || self.extended_rom_size == 0 {
            return 65536 * (u64::from(self.rom_size) + 1);
        }

        let ext = u64::from(self.extended_rom_size);
        let multiplier = match ext >> 14 {
            0 => 1024 * 1024,
            1 => 1024 * 1024 * 1024,
            _ => 1,
        };
        (ext & 0x3fff) * multiplier
    }
}

impl Record for BiosInfo {
    const TABLE_TYPE: TableType = TableType::BIOS_INFORMATION;
    const NAME: &'static str = "BIOSInfo";
    const MIN_LEN: usize = 0x12;
    const FIELDS: &'static [F] = &[
        F::string("Vendor"),                      // 04h
        F::string("Version"),                     // 05h
        F::u16("StartingAddressSegment"),         // 06h
        F::string("ReleaseDate"),                 // 08h
        F::u8("ROMSize"),                         // 09h
        F::u64("Characteristics"),                // 0Ah
        F::u8("CharacteristicsExt1"),             // 12h
        F::u8("CharacteristicsExt2"),             // 13h
        F::u8("BIOSMajor").default_value(0xff),   // 14h
        F::u8("BIOSMinor").default_value(0xff),   // 15h
        F::u8("ECMajor").default_value(0xff),     // 16h
        F::u8("ECMinor").default_value(0xff),     // 17h
        F::u16("ExtendedROMSize"),                // 18h
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            vendor: f.string()?,
            version: f.string()?,
            starting_address_segment: f.u16()?,
            release_date: f.string()?,
            rom_size: f.u8()?,
            characteristics: BiosCharacteristics::from_bits_retain(f.u64()?),
            characteristics_ext1: BiosCharacteristicsExt1::from_bits_retain(f.u8()?),
            characteristics_ext2: BiosCharacteristicsExt2::from_bits_retain(f.u8()?),
            bios_major: f.u8()?,
            bios_minor: f.u8()?,
            ec_major: f.u8()?,
            ec_minor: f.u8()?,
            extended_rom_size: f.u16()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.vendor.clone()),
            FieldValue::Str(self.version.clone()),
            FieldValue::U16(self.starting_address_segment),
            FieldValue::Str(self.release_date.clone()),
            FieldValue::U8(self.rom_size),
            FieldValue::U64(self.characteristics.bits()),
            FieldValue::U8(self.characteristics_ext1.bits()),
            FieldValue::U8(self.characteristics_ext2.bits()),
            FieldValue::U8(self.bios_major),
            FieldValue::U8(self.bios_minor),
            FieldValue::U8(self.ec_major),
            FieldValue::U8(self.ec_minor),
            FieldValue::U16(self.extended_rom_size),
        ]
    }
}

impl fmt::Display for BiosInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tVendor: {}", self.vendor)?;
        write!(f, "\n\tVersion: {}", self.version)?;
        write!(f, "\n\tRelease Date: {}", self.release_date)?;
        if self.starting_address_segment != 0 {
            let runtime = (0x10000 - u64::from(self.starting_address_segment)) << 4;
            write!(f, "\n\tAddress: 0x{:04X}0", self.starting_address_segment)?;
            write!(f, "\n\tRuntime Size: {}", ByteSize(runtime))?;
        }
        write!(f, "\n\tROM Size: {}", ByteSize(self.rom_size_bytes()))?;
        write!(f, "\n\tCharacteristics:")?;
        write_flag_lines(f, self.characteristics, CHARACTERISTICS)?;
        write_flag_lines(f, self.characteristics_ext1, CHARACTERISTICS_EXT1)?;
        write_flag_lines(f, self.characteristics_ext2, CHARACTERISTICS_EXT2)?;
        if self.bios_major != 0xff {
            write!(f, "\n\tBIOS Revision: {}.{}", self.bios_major, self.bios_minor)?;
        }
        if self.ec_major != 0xff {
            write!(f, "\n\tFirmware Revision: {}.{}", self.ec_major, self.ec_minor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::error::Error;
    use crate::table::Tables;

    /// SMBIOS 2.0 BIOS structure: 18 bytes, no extension bytes.
    const BIOS_18: [u8; 28] = [
        0x00, 0x12, 0x00, 0x00, // header
        0x01, // vendor
        0x02, // version
        0x00, 0xe0, // starting segment
        0x00, // release date
        0xff, // ROM size
        0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // characteristics
        b'A', b'c', b'm', b'e', 0x00, b'1', b'.', b'0', 0x00, 0x00,
    ];

    fn parse(bytes: &[u8]) -> Result<BiosInfo> {
        let tables = Tables::parse(bytes)?;
        BiosInfo::parse(tables.iter().next().unwrap(), StringPolicy::Tolerant)
    }

    #[test]
    fn test_short_structure_uses_defaults() {
        let bios = parse(&BIOS_18).unwrap();
        assert_eq!(bios.vendor.as_str(), Some("Acme"));
        assert_eq!(bios.version.as_str(), Some("1.0"));
        assert_eq!(bios.release_date, SmbiosString::NotSpecified);
        assert_eq!(bios.starting_address_segment, 0xe000);
        assert_eq!(bios.characteristics, BiosCharacteristics::PCI);
        assert!(bios.characteristics_ext1.is_empty());
        assert_eq!(bios.bios_major, 0xff);
        assert_eq!(bios.ec_minor, 0xff);
        assert_eq!(bios.extended_rom_size, 0);
        assert_eq!(bios.rom_size_bytes(), 0x100_0000);
    }

    #[test]
    fn test_extended_rom_size() {
        let mut bios = BiosInfo { rom_size: 0xff, extended_rom_size: 32, ..Default::default() };
        assert_eq!(bios.rom_size_bytes(), 32 << 20);
        bios.extended_rom_size = (1 << 14) | 2;
        assert_eq!(bios.rom_size_bytes(), 2 << 30);
        bios.extended_rom_size = (2 << 14) | 5;
        assert_eq!(bios.rom_size_bytes(), 5);
        bios.rom_size = 0x0f;
        assert_eq!(bios.rom_size_bytes(), 1 << 20);
    }

    #[test]
    fn test_too_short() {
        let bytes = [0x00, 0x11, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x00, 0x00];
        assert_eq!(
            parse(&bytes),
            Err(Error::UnexpectedEndOfData { context: "BIOSInfo", offset: 0x11 })
        );
    }

    #[test]
    fn test_wrong_type() {
        let mut bytes = BIOS_18;
        bytes[0] = 0x01;
        assert_eq!(
            parse(&bytes),
            Err(Error::UnexpectedTableType {
                expected: TableType::BIOS_INFORMATION,
                found: TableType::SYSTEM_INFORMATION,
            })
        );
    }

    #[test]
    fn test_encode_round_trip() {
        let bios = parse(&BIOS_18).unwrap();
        let raw = bios.encode(0).unwrap();
        assert_eq!(raw.len(), 0x1a);
        let again = BiosInfo::parse(&raw, StringPolicy::Strict).unwrap();
        assert_eq!(again.to_fields(), bios.to_fields());
    }

    #[test]
    fn test_display() {
        let text = parse(&BIOS_18).unwrap().to_string();
        assert!(text.starts_with("Handle 0x0000, DMI type 0, 18 bytes\nBIOS Information"));
        assert!(text.contains("\n\tVendor: Acme"));
        assert!(text.contains("\n\tRelease Date: Not Specified"));
        assert!(text.contains("\n\tAddress: 0xE0000"));
        assert!(text.contains("\n\tRuntime Size: 128 kB"));
        assert!(text.contains("\n\tROM Size: 16 MB"));
        assert!(text.contains("\n\tCharacteristics:\n\t\tPCI is supported"));
        assert!(!text.contains("BIOS Revision"));
    }
}
