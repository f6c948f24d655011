//! Processor Information (Type 4)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{dense_name, write_flag_lines, Lookup};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

bitflags! {
    /// Processor characteristics (offset 26h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ProcessorCharacteristics: u16 {
        const RESERVED = 1 << 0;
        const UNKNOWN = 1 << 1;
        const CAPABLE_64BIT = 1 << 2;
        const MULTI_CORE = 1 << 3;
        const HARDWARE_THREAD = 1 << 4;
        const EXECUTE_PROTECTION = 1 << 5;
        const ENHANCED_VIRTUALIZATION = 1 << 6;
        const POWER_PERFORMANCE_CONTROL = 1 << 7;
        const CAPABLE_128BIT = 1 << 8;
        const ARM64_SOC_ID = 1 << 9;
    }
}

const CHARACTERISTICS: &[(ProcessorCharacteristics, &str)] = &[
    (ProcessorCharacteristics::UNKNOWN, "Unknown"),
    (ProcessorCharacteristics::CAPABLE_64BIT, "64-bit capable"),
    (ProcessorCharacteristics::MULTI_CORE, "Multi-Core"),
    (ProcessorCharacteristics::HARDWARE_THREAD, "Hardware Thread"),
    (ProcessorCharacteristics::EXECUTE_PROTECTION, "Execute Protection"),
    (ProcessorCharacteristics::ENHANCED_VIRTUALIZATION, "Enhanced Virtualization"),
    (ProcessorCharacteristics::POWER_PERFORMANCE_CONTROL, "Power/Performance Control"),
    (ProcessorCharacteristics::CAPABLE_128BIT, "128-bit Capable"),
    (ProcessorCharacteristics::ARM64_SOC_ID, "Arm64 SoC ID"),
];

const PROCESSOR_TYPES: &[&str] = &[
    "Other",
    "Unknown",
    "Central Processor",
    "Math Processor",
    "DSP Processor",
    "Video Processor",
];

const STATUS: &[(u8, &str)] = &[
    (0x00, "Unknown"),
    (0x01, "Enabled"),
    (0x02, "Disabled By User"),
    (0x03, "Disabled By BIOS"),
    (0x04, "Idle"),
    (0x07, "Other"),
];

const UPGRADES: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "Daughter Board"),
    (0x04, "ZIF Socket"),
    (0x05, "Replaceable Piggy Back"),
    (0x06, "None"),
    (0x07, "LIF Socket"),
    (0x08, "Slot 1"),
    (0x09, "Slot 2"),
    (0x0a, "370-pin Socket"),
    (0x0b, "Slot A"),
    (0x0c, "Slot M"),
    (0x0d, "Socket 423"),
    (0x0e, "Socket A (Socket 462)"),
    (0x0f, "Socket 478"),
    (0x10, "Socket 754"),
    (0x11, "Socket 940"),
    (0x12, "Socket 939"),
    (0x13, "Socket mPGA604"),
    (0x14, "Socket LGA771"),
    (0x15, "Socket LGA775"),
    (0x16, "Socket S1"),
    (0x17, "Socket AM2"),
    (0x18, "Socket F (1207)"),
    (0x19, "Socket LGA1366"),
    (0x1a, "Socket G34"),
    (0x1b, "Socket AM3"),
    (0x1c, "Socket C32"),
    (0x1d, "Socket LGA1156"),
    (0x1e, "Socket LGA1567"),
    (0x1f, "Socket PGA988A"),
    (0x20, "Socket BGA1288"),
    (0x21, "Socket rPGA988B"),
    (0x22, "Socket BGA1023"),
    (0x23, "Socket BGA1224"),
    (0x24, "Socket BGA1155"),
    (0x25, "Socket LGA1356"),
    (0x26, "Socket LGA2011"),
    (0x27, "Socket FS1"),
    (0x28, "Socket FS2"),
    (0x29, "Socket FM1"),
    (0x2a, "Socket FM2"),
    (0x2b, "Socket LGA2011-3"),
    (0x2c, "Socket LGA1356-3"),
    (0x2d, "Socket LGA1150"),
    (0x2e, "Socket BGA1168"),
    (0x2f, "Socket BGA1234"),
    (0x30, "Socket BGA1364"),
    (0x31, "Socket AM4"),
    (0x32, "Socket LGA1151"),
    (0x33, "Socket BGA1356"),
    (0x34, "Socket BGA1440"),
    (0x35, "Socket BGA1515"),
    (0x36, "Socket LGA3647-1"),
    (0x37, "Socket SP3"),
    (0x38, "Socket SP3r2"),
    (0x39, "Socket LGA2066"),
    (0x3a, "Socket BGA1392"),
    (0x3b, "Socket BGA1510"),
    (0x3c, "Socket BGA1528"),
    (0x3d, "Socket LGA4189"),
    (0x3e, "Socket LGA1200"),
    (0x3f, "Socket LGA4677"),
    (0x40, "Socket LGA1700"),
    (0x41, "Socket BGA1744"),
    (0x42, "Socket BGA1781"),
    (0x43, "Socket BGA1211"),
    (0x44, "Socket BGA2422"),
    (0x45, "Socket LGA1211"),
    (0x46, "Socket LGA2422"),
    (0x47, "Socket LGA5773"),
    (0x48, "Socket BGA5773"),
];

/// Family name for a Family or Family2 code.
fn family_name(code: u16) -> Option<&'static str> {
    Some(match code {
        0x01 => "Other",
        0x02 => "Unknown",
        0x03 => "8086",
        0x04 => "80286",
        0x05 => "80386",
        0x06 => "80486",
        0x07 => "8087",
        0x08 => "80287",
        0x09 => "80387",
        0x0a => "80487",
        0x0b => "Pentium",
        0x0c => "Pentium Pro",
        0x0d => "Pentium II",
        0x0e => "Pentium MMX",
        0x0f => "Celeron",
        0x10 => "Pentium II Xeon",
        0x11 => "Pentium III",
        0x18 => "Duron",
        0x19 => "K5",
        0x1a => "K6",
        0x1b => "K6-2",
        0x1c => "K6-3",
        0x1d => "Athlon",
        0x28 => "Core Duo",
        0x29 => "Core Duo Mobile",
        0x2a => "Core Solo Mobile",
        0x2b => "Atom",
        0x2c => "Core M",
        0x2d => "Core m3",
        0x2e => "Core m5",
        0x2f => "Core m7",
        0x38 => "Turion II Ultra Dual-Core Mobile M",
        0x39 => "Turion II Dual-Core Mobile M",
        0x3a => "Athlon II Dual-Core M",
        0x3b => "Opteron 6100",
        0x3c => "Opteron 4100",
        0x3d => "Opteron 6200",
        0x3e => "Opteron 4200",
        0x3f => "FX",
        0x6b => "Zen",
        0x70 => "Hobbit",
        0x78 => "Crusoe TM5000",
        0x79 => "Crusoe TM3000",
        0x7a => "Efficeon TM8000",
        0x80 => "Weitek",
        0x82 => "Itanium",
        0x83 => "Athlon 64",
        0x84 => "Opteron",
        0x85 => "Sempron",
        0x86 => "Turion 64",
        0x87 => "Dual-Core Opteron",
        0x88 => "Athlon 64 X2",
        0x89 => "Turion 64 X2",
        0x8a => "Quad-Core Opteron",
        0x8b => "Third-Generation Opteron",
        0x8c => "Phenom FX",
        0x8d => "Phenom X4",
        0x8e => "Phenom X2",
        0x8f => "Athlon X2",
        0xa1 => "Quad-Core Xeon 3200",
        0xa2 => "Dual-Core Xeon 3000",
        0xa3 => "Quad-Core Xeon 5300",
        0xa4 => "Dual-Core Xeon 5100",
        0xa5 => "Dual-Core Xeon 5000",
        0xa6 => "Dual-Core Xeon LV",
        0xa7 => "Dual-Core Xeon ULV",
        0xa8 => "Dual-Core Xeon 7100",
        0xa9 => "Quad-Core Xeon 5400",
        0xaa => "Quad-Core Xeon",
        0xab => "Dual-Core Xeon 5200",
        0xac => "Dual-Core Xeon 7200",
        0xad => "Quad-Core Xeon 7300",
        0xae => "Quad-Core Xeon 7400",
        0xaf => "Multi-Core Xeon 7400",
        0xb3 => "Xeon",
        0xb5 => "Pentium 4",
        0xbf => "Core 2 Duo",
        0xc0 => "Core 2 Solo",
        0xc1 => "Core 2 Extreme",
        0xc2 => "Core 2 Quad",
        0xc3 => "Core 2 Extreme Mobile",
        0xc4 => "Core 2 Duo Mobile",
        0xc5 => "Core 2 Solo Mobile",
        0xc6 => "Core i7",
        0xc7 => "Dual-Core Celeron",
        0xcd => "Core i5",
        0xce => "Core i3",
        0xcf => "Core i9",
        0xe6 => "Embedded Opteron Quad-Core",
        0xe7 => "Phenom Triple-Core",
        0xee => "Opteron 3000",
        0xef => "Opteron 5300",
        0xfe => "Family Indicated By Family2",
        0x100 => "ARMv7",
        0x101 => "ARMv8",
        0x102 => "ARMv9",
        0x104 => "SH-3",
        0x105 => "SH-4",
        0x118 => "ARM",
        0x119 => "StrongARM",
        0x12c => "6x86",
        0x12d => "MediaGX",
        0x12e => "MII",
        0x140 => "WinChip",
        0x15e => "DSP",
        0x1f4 => "Video Processor",
        0x200 => "RV32",
        0x201 => "RV64",
        0x202 => "RV128",
        0x258 => "LoongArch",
        _ => return None,
    })
}

/// Voltage byte (offset 11h).
///
/// Bit 7 set: bits 6:0 hold the current voltage in tenths of a volt.
/// Bit 7 clear: bits 2:0 flag the supported legacy voltages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voltage {
    /// Tenths of a volt
    Current(u8),
    Legacy { v5_0: bool, v3_3: bool, v2_9: bool },
}

impl From<u8> for Voltage {
    fn from(v: u8) -> Self {
        if v & 0x80 != 0 {
            Self::Current(v & 0x7f)
        } else {
            Self::Legacy { v5_0: v & 0x01 != 0, v3_3: v & 0x02 != 0, v2_9: v & 0x04 != 0 }
        }
    }
}

impl fmt::Display for Voltage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Current(tenths) => write!(f, "{}.{} V", tenths / 10, tenths % 10),
            Self::Legacy { v5_0: false, v3_3: false, v2_9: false } => f.write_str("Unknown"),
            Self::Legacy { v5_0, v3_3, v2_9 } => {
                let mut sep = "";
                for (set, text) in [(v5_0, "5.0 V"), (v3_3, "3.3 V"), (v2_9, "2.9 V")] {
                    if set {
                        write!(f, "{}{}", sep, text)?;
                        sep = " ";
                    }
                }
                Ok(())
            }
        }
    }
}

/// Processor Information (Type 4)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessorInfo {
    pub table: RawStructure,
    pub socket_designation: SmbiosString,
    pub processor_type: u8,
    /// Family code; 0xFE defers to `processor_family2`
    pub processor_family: u8,
    pub manufacturer: SmbiosString,
    pub processor_id: [u8; 8],
    pub version: SmbiosString,
    pub voltage: u8,
    /// MHz, 0 if unknown
    pub external_clock: u16,
    pub max_speed: u16,
    pub current_speed: u16,
    pub status: u8,
    pub upgrade: u8,
    pub l1_cache_handle: u16,
    pub l2_cache_handle: u16,
    pub l3_cache_handle: u16,
    pub serial_number: SmbiosString,
    pub asset_tag: SmbiosString,
    pub part_number: SmbiosString,
    pub core_count1: u8,
    pub core_enabled1: u8,
    pub thread_count1: u8,
    pub characteristics: ProcessorCharacteristics,
    pub processor_family2: u16,
    pub core_count2: u16,
    pub core_enabled2: u16,
    pub thread_count2: u16,
    pub thread_enabled: u16,
}

impl ProcessorInfo {
    fn length(&self) -> usize {
        usize::from(self.table.header().length)
    }

    /// Family code, taken from Family2 when the 8-bit field says so.
    pub fn family(&self) -> u16 {
        if self.processor_family == 0xfe && self.length() >= 0x2a {
            self.processor_family2
        } else {
            u16::from(self.processor_family)
        }
    }

    pub fn family_name(&self) -> &'static str {
        family_name(self.family()).unwrap_or(super::OUT_OF_SPEC)
    }

    pub fn core_count(&self) -> u16 {
        if self.core_count1 == 0xff && self.length() >= 0x2c {
            self.core_count2
        } else {
            u16::from(self.core_count1)
        }
    }

    pub fn core_enabled(&self) -> u16 {
        if self.core_enabled1 == 0xff && self.length() >= 0x2e {
            self.core_enabled2
        } else {
            u16::from(self.core_enabled1)
        }
    }

    pub fn thread_count(&self) -> u16 {
        if self.thread_count1 == 0xff && self.length() >= 0x30 {
            self.thread_count2
        } else {
            u16::from(self.thread_count1)
        }
    }

    pub fn voltage(&self) -> Voltage {
        Voltage::from(self.voltage)
    }

    pub fn socket_populated(&self) -> bool {
        self.status & 0x40 != 0
    }
}

impl Record for ProcessorInfo {
    const TABLE_TYPE: TableType = TableType::PROCESSOR_INFORMATION;
    const NAME: &'static str = "ProcessorInfo";
    const MIN_LEN: usize = 0x1a;
    const FIELDS: &'static [F] = &[
        F::string("SocketDesignation"), // 04h
        F::u8("ProcessorType"),         // 05h
        F::u8("Family"),                // 06h
        F::string("Manufacturer"),      // 07h
        F::bytes("ID", 8),              // 08h
        F::string("Version"),           // 10h
        F::u8("Voltage"),               // 11h
        F::u16("ExternalClock"),        // 12h
        F::u16("MaxSpeed"),             // 14h
        F::u16("CurrentSpeed"),         // 16h
        F::u8("Status"),                // 18h
        F::u8("Upgrade"),               // 19h
        F::u16("L1CacheHandle"),        // 1Ah
        F::u16("L2CacheHandle"),        // 1Ch
        F::u16("L3CacheHandle"),        // 1Eh
        F::string("SerialNumber"),      // 20h
        F::string("AssetTag"),          // 21h
        F::string("PartNumber"),        // 22h
        F::u8("CoreCount"),             // 23h
        F::u8("CoreEnabled"),           // 24h
        F::u8("ThreadCount"),           // 25h
        F::u16("Characteristics"),      // 26h
        F::u16("Family2"),              // 28h
        F::u16("CoreCount2"),           // 2Ah
        F::u16("CoreEnabled2"),         // 2Ch
        F::u16("ThreadCount2"),         // 2Eh
        F::u16("ThreadEnabled"),        // 30h
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            socket_designation: f.string()?,
            processor_type: f.u8()?,
            processor_family: f.u8()?,
            manufacturer: f.string()?,
            processor_id: f.bytes::<8>()?,
            version: f.string()?,
            voltage: f.u8()?,
            external_clock: f.u16()?,
            max_speed: f.u16()?,
            current_speed: f.u16()?,
            status: f.u8()?,
            upgrade: f.u8()?,
            l1_cache_handle: f.u16()?,
            l2_cache_handle: f.u16()?,
            l3_cache_handle: f.u16()?,
            serial_number: f.string()?,
            asset_tag: f.string()?,
            part_number: f.string()?,
            core_count1: f.u8()?,
            core_enabled1: f.u8()?,
            thread_count1: f.u8()?,
            characteristics: ProcessorCharacteristics::from_bits_retain(f.u16()?),
            processor_family2: f.u16()?,
            core_count2: f.u16()?,
            core_enabled2: f.u16()?,
            thread_count2: f.u16()?,
            thread_enabled: f.u16()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.socket_designation.clone()),
            FieldValue::U8(self.processor_type),
            FieldValue::U8(self.processor_family),
            FieldValue::Str(self.manufacturer.clone()),
            FieldValue::Bytes(self.processor_id.to_vec()),
            FieldValue::Str(self.version.clone()),
            FieldValue::U8(self.voltage),
            FieldValue::U16(self.external_clock),
            FieldValue::U16(self.max_speed),
            FieldValue::U16(self.current_speed),
            FieldValue::U8(self.status),
            FieldValue::U8(self.upgrade),
            FieldValue::U16(self.l1_cache_handle),
            FieldValue::U16(self.l2_cache_handle),
            FieldValue::U16(self.l3_cache_handle),
            FieldValue::Str(self.serial_number.clone()),
            FieldValue::Str(self.asset_tag.clone()),
            FieldValue::Str(self.part_number.clone()),
            FieldValue::U8(self.core_count1),
            FieldValue::U8(self.core_enabled1),
            FieldValue::U8(self.thread_count1),
            FieldValue::U16(self.characteristics.bits()),
            FieldValue::U16(self.processor_family2),
            FieldValue::U16(self.core_count2),
            FieldValue::U16(self.core_enabled2),
            FieldValue::U16(self.thread_count2),
            FieldValue::U16(self.thread_enabled),
        ]
    }
}

struct Speed(u16);

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("Unknown"),
            mhz => write!(f, "{} MHz", mhz),
        }
    }
}

struct CacheHandle(u16);

impl fmt::Display for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0xffff => f.write_str("Not Provided"),
            h => write!(f, "0x{:04X}", h),
        }
    }
}

impl fmt::Display for ProcessorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = self.length();
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tSocket Designation: {}", self.socket_designation)?;
        write!(f, "\n\tType: {}", dense_name(self.processor_type, PROCESSOR_TYPES))?;
        write!(f, "\n\tFamily: {}", self.family_name())?;
        write!(f, "\n\tManufacturer: {}", self.manufacturer)?;
        write!(f, "\n\tID:")?;
        for b in &self.processor_id {
            write!(f, " {:02X}", b)?;
        }
        write!(f, "\n\tVersion: {}", self.version)?;
        write!(f, "\n\tVoltage: {}", self.voltage())?;
        write!(f, "\n\tExternal Clock: {}", Speed(self.external_clock))?;
        write!(f, "\n\tMax Speed: {}", Speed(self.max_speed))?;
        write!(f, "\n\tCurrent Speed: {}", Speed(self.current_speed))?;
        if self.socket_populated() {
            write!(
                f,
                "\n\tStatus: Populated, {}",
                Lookup { value: self.status & 0x07, names: STATUS }
            )?;
        } else {
            write!(f, "\n\tStatus: Unpopulated")?;
        }
        write!(f, "\n\tUpgrade: {}", Lookup { value: self.upgrade, names: UPGRADES })?;
        if length >= 0x20 {
            write!(f, "\n\tL1 Cache Handle: {}", CacheHandle(self.l1_cache_handle))?;
            write!(f, "\n\tL2 Cache Handle: {}", CacheHandle(self.l2_cache_handle))?;
            write!(f, "\n\tL3 Cache Handle: {}", CacheHandle(self.l3_cache_handle))?;
        }
        if length >= 0x23 {
            write!(f, "\n\tSerial Number: {}", self.serial_number)?;
            write!(f, "\n\tAsset Tag: {}", self.asset_tag)?;
            write!(f, "\n\tPart Number: {}", self.part_number)?;
        }
        if length >= 0x28 {
            write!(f, "\n\tCore Count: {}", self.core_count())?;
            write!(f, "\n\tCore Enabled: {}", self.core_enabled())?;
            write!(f, "\n\tThread Count: {}", self.thread_count())?;
            write!(f, "\n\tCharacteristics:")?;
            if self.characteristics.is_empty() {
                write!(f, " None")?;
            }
            write_flag_lines(f, self.characteristics, CHARACTERISTICS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::error::Error;
    use crate::table::Header;
    use alloc::string::ToString;

    fn raw(data: &[u8], strings: &[&str]) -> RawStructure {
        RawStructure::new(
            Header {
                table_type: TableType::PROCESSOR_INFORMATION,
                length: (data.len() + Header::SIZE) as u8,
                handle: 0x0004,
            },
            data.to_vec(),
            strings.iter().map(|s| s.as_bytes().to_vec()).collect(),
        )
    }

    /// SMBIOS 3.0 processor, 0x30 bytes.
    fn cpu_data() -> Vec<u8> {
        let mut d = vec![
            0x01, // socket
            0x03, // central processor
            0xfe, // family via Family2
            0x02, // manufacturer
            0x57, 0x06, 0x05, 0x00, 0xff, 0xfb, 0xeb, 0xbf, // ID
            0x03, // version
            0x8c, // 1.2 V
            0x64, 0x00, // external clock
            0xb8, 0x0b, // max speed 3000
            0xc4, 0x09, // current speed 2500
            0x41, // populated, enabled
            0x01, // upgrade
            0x10, 0x00, 0x11, 0x00, 0xff, 0xff, // cache handles
            0x00, 0x00, 0x04, // serial, asset, part
            0xff, 0xff, 0xff, // counts deferred
            0xfc, 0x00, // characteristics
            0x01, 0x01, // Family2 ARMv8
            0x80, 0x00, // core count 128
            0x7f, 0x00, // cores enabled 127
        ];
        d.extend_from_slice(&[0x00, 0x01]); // thread count 256
        d
    }

    #[test]
    fn test_parse_extended_counts() {
        let data = cpu_data();
        assert_eq!(data.len() + Header::SIZE, 0x30);
        let t = raw(&data, &["CPU0", "Ampere", "Altra", "PN-1"]);
        let p = ProcessorInfo::parse(&t, StringPolicy::Strict).unwrap();

        assert_eq!(p.family(), 0x101);
        assert_eq!(p.family_name(), "ARMv8");
        assert_eq!(p.core_count(), 128);
        assert_eq!(p.core_enabled(), 127);
        assert_eq!(p.thread_count(), 256);
        assert_eq!(p.voltage(), Voltage::Current(12));
        assert_eq!(p.l3_cache_handle, 0xffff);
        assert_eq!(p.part_number.as_str(), Some("PN-1"));
        assert_eq!(p.thread_enabled, 0);
    }

    #[test]
    fn test_short_counts_ignore_extension() {
        // 0x2C bytes: CoreCount2 present, ThreadCount2 absent
        let data = cpu_data();
        let p = ProcessorInfo::parse(&raw(&data[..0x28], &["CPU0", "Ampere", "Altra", "PN-1"]), StringPolicy::Strict)
            .unwrap();
        assert_eq!(p.core_count(), 128);
        assert_eq!(p.core_enabled(), 0xff);
        assert_eq!(p.thread_count(), 0xff);
    }

    #[test]
    fn test_minimal_processor() {
        let mut data = cpu_data();
        data.truncate(0x16);
        data[2] = 0xb3;
        data[13] = 0x03;
        let p = ProcessorInfo::parse(&raw(&data, &["CPU0", "Intel", "Xeon"]), StringPolicy::Strict)
            .unwrap();
        assert_eq!(p.family_name(), "Xeon");
        assert_eq!(p.l1_cache_handle, 0);

        let text = p.to_string();
        assert!(text.contains("\n\tID: 57 06 05 00 FF FB EB BF"));
        assert!(text.contains("\n\tVoltage: 5.0 V 3.3 V"));
        assert!(text.contains("\n\tStatus: Populated, Enabled"));
        assert!(text.ends_with("\n\tUpgrade: Other"));
    }

    #[test]
    fn test_too_short() {
        let err = ProcessorInfo::parse(&raw(&cpu_data()[..0x10], &[]), StringPolicy::Strict)
            .unwrap_err();
        assert_eq!(err, Error::UnexpectedEndOfData { context: "ProcessorInfo", offset: 0x14 });
    }

    #[test]
    fn test_display_characteristics() {
        let t = raw(&cpu_data(), &["CPU0", "Ampere", "Altra", "PN-1"]);
        let text = ProcessorInfo::parse(&t, StringPolicy::Strict).unwrap().to_string();
        assert!(text.contains("\n\tL3 Cache Handle: Not Provided"));
        assert!(text.contains("\n\tCurrent Speed: 2500 MHz"));
        assert!(text.ends_with(
            "\n\tCharacteristics:\n\t\t64-bit capable\n\t\tMulti-Core\n\t\tHardware Thread\
             \n\t\tExecute Protection\n\t\tEnhanced Virtualization\n\t\tPower/Performance Control"
        ));
    }

    #[test]
    fn test_encode_round_trip() {
        let t = raw(&cpu_data(), &["CPU0", "Ampere", "Altra", "PN-1"]);
        let p = ProcessorInfo::parse(&t, StringPolicy::Strict).unwrap();
        let encoded = p.encode(0x0004).unwrap();
        // ThreadEnabled was absent and is now written
        assert_eq!(encoded.len(), 0x32);
        assert_eq!(&encoded.data()[..t.data().len()], t.data());
        assert_eq!(encoded.strings(), t.strings());
    }
}
