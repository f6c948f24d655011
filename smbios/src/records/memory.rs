//! Memory Device (Type 17)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{dense_name, write_flag_lines, ByteSize};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

bitflags! {
    /// Memory type detail (offset 13h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct MemoryTypeDetail: u16 {
        const RESERVED = 1 << 0;
        const OTHER = 1 << 1;
        const UNKNOWN = 1 << 2;
        const FAST_PAGED = 1 << 3;
        const STATIC_COLUMN = 1 << 4;
        const PSEUDO_STATIC = 1 << 5;
        const RAMBUS = 1 << 6;
        const SYNCHRONOUS = 1 << 7;
        const CMOS = 1 << 8;
        const EDO = 1 << 9;
        const WINDOW_DRAM = 1 << 10;
        const CACHE_DRAM = 1 << 11;
        const NON_VOLATILE = 1 << 12;
        const REGISTERED = 1 << 13;
        const UNBUFFERED = 1 << 14;
        const LRDIMM = 1 << 15;
    }
}

const TYPE_DETAIL: &[(MemoryTypeDetail, &str)] = &[
    (MemoryTypeDetail::OTHER, "Other"),
    (MemoryTypeDetail::UNKNOWN, "Unknown"),
    (MemoryTypeDetail::FAST_PAGED, "Fast-paged"),
    (MemoryTypeDetail::STATIC_COLUMN, "Static Column"),
    (MemoryTypeDetail::PSEUDO_STATIC, "Pseudo-static"),
    (MemoryTypeDetail::RAMBUS, "RAMBus"),
    (MemoryTypeDetail::SYNCHRONOUS, "Synchronous"),
    (MemoryTypeDetail::CMOS, "CMOS"),
    (MemoryTypeDetail::EDO, "EDO"),
    (MemoryTypeDetail::WINDOW_DRAM, "Window DRAM"),
    (MemoryTypeDetail::CACHE_DRAM, "Cache DRAM"),
    (MemoryTypeDetail::NON_VOLATILE, "Non-Volatile"),
    (MemoryTypeDetail::REGISTERED, "Registered (Buffered)"),
    (MemoryTypeDetail::UNBUFFERED, "Unbuffered (Unregistered)"),
    (MemoryTypeDetail::LRDIMM, "LRDIMM"),
];

const FORM_FACTORS: &[&str] = &[
    "Other",
    "Unknown",
    "SIMM",
    "SIP",
    "Chip",
    "DIP",
    "ZIP",
    "Proprietary Card",
    "DIMM",
    "TSOP",
    "Row Of Chips",
    "RIMM",
    "SODIMM",
    "SRIMM",
    "FB-DIMM",
    "Die",
    "CAMM",
];

const MEMORY_TYPES: &[&str] = &[
    "Other",
    "Unknown",
    "DRAM",
    "EDRAM",
    "VRAM",
    "SRAM",
    "RAM",
    "ROM",
    "Flash",
    "EEPROM",
    "FEPROM",
    "EPROM",
    "CDRAM",
    "3DRAM",
    "SDRAM",
    "SGRAM",
    "RDRAM",
    "DDR",
    "DDR2",
    "DDR2 FB-DIMM",
    "Reserved",
    "Reserved",
    "Reserved",
    "DDR3",
    "FBD2",
    "DDR4",
    "LPDDR",
    "LPDDR2",
    "LPDDR3",
    "LPDDR4",
    "Logical non-volatile device",
    "HBM",
    "HBM2",
    "DDR5",
    "LPDDR5",
    "HBM3",
];

const TECHNOLOGIES: &[&str] = &[
    "Other",
    "Unknown",
    "DRAM",
    "NVDIMM-N",
    "NVDIMM-F",
    "NVDIMM-P",
    "Intel Optane persistent memory",
    "MRDIMM",
];

/// Memory Device (Type 17)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDevice {
    pub table: RawStructure,
    pub physical_memory_array_handle: u16,
    pub memory_error_information_handle: u16,
    /// Bits, 0xFFFF if unknown
    pub total_width: u16,
    pub data_width: u16,
    /// Raw size word; see [`MemoryDevice::size_bytes`]
    pub size: u16,
    pub form_factor: u8,
    pub device_set: u8,
    pub device_locator: SmbiosString,
    pub bank_locator: SmbiosString,
    pub memory_type: u8,
    pub type_detail: MemoryTypeDetail,
    /// MT/s
    pub speed: u16,
    pub manufacturer: SmbiosString,
    pub serial_number: SmbiosString,
    pub asset_tag: SmbiosString,
    pub part_number: SmbiosString,
    /// Rank in bits 3:0
    pub attributes: u8,
    /// MiB, used when `size` is 0x7FFF
    pub extended_size: u32,
    pub configured_memory_speed: u16,
    /// Millivolts
    pub minimum_voltage: u16,
    pub maximum_voltage: u16,
    pub configured_voltage: u16,
    pub memory_technology: u8,
    pub operating_mode_capability: u16,
    pub firmware_version: SmbiosString,
    pub module_manufacturer_id: u16,
    pub module_product_id: u16,
    pub subsystem_controller_manufacturer_id: u16,
    pub subsystem_controller_product_id: u16,
    pub non_volatile_size: u64,
    pub volatile_size: u64,
    pub cache_size: u64,
    pub logical_size: u64,
    pub extended_speed: u32,
    pub extended_configured_memory_speed: u32,
}

impl MemoryDevice {
    /// Installed size in bytes.
    ///
    /// `None` when no module is installed (0) or the size is unknown
    /// (0xFFFF). Bit 15 selects KiB units instead of MiB; 0x7FFF defers to
    /// the 32-bit extended size.
    pub fn size_bytes(&self) -> Option<u64> {
        match self.size {
            0 | 0xffff => None,
            0x7fff if self.table.header().length >= 0x20 => {
                Some(u64::from(self.extended_size & 0x7fff_ffff) << 20)
            }
            s if s & 0x8000 != 0 => Some(u64::from(s & 0x7fff) << 10),
            s => Some(u64::from(s) << 20),
        }
    }

    pub fn rank(&self) -> u8 {
        self.attributes & 0x0f
    }
}

impl Record for MemoryDevice {
    const TABLE_TYPE: TableType = TableType::MEMORY_DEVICE;
    const NAME: &'static str = "MemoryDevice";
    const MIN_LEN: usize = 0x15;
    const FIELDS: &'static [F] = &[
        F::u16("PhysicalMemoryArrayHandle"),               // 04h
        F::u16("MemoryErrorInformationHandle"),            // 06h
        F::u16("TotalWidth"),                              // 08h
        F::u16("DataWidth"),                               // 0Ah
        F::u16("Size"),                                    // 0Ch
        F::u8("FormFactor"),                               // 0Eh
        F::u8("DeviceSet"),                                // 0Fh
        F::string("DeviceLocator"),                        // 10h
        F::string("BankLocator"),                          // 11h
        F::u8("MemoryType"),                               // 12h
        F::u16("TypeDetail"),                              // 13h
        F::u16("Speed"),                                   // 15h
        F::string("Manufacturer"),                         // 17h
        F::string("SerialNumber"),                         // 18h
        F::string("AssetTag"),                             // 19h
        F::string("PartNumber"),                           // 1Ah
        F::u8("Attributes"),                               // 1Bh
        F::u32("ExtendedSize"),                            // 1Ch
        F::u16("ConfiguredMemorySpeed"),                   // 20h
        F::u16("MinimumVoltage"),                          // 22h
        F::u16("MaximumVoltage"),                          // 24h
        F::u16("ConfiguredVoltage"),                       // 26h
        F::u8("MemoryTechnology"),                         // 28h
        F::u16("MemoryOperatingModeCapability"),           // 29h
        F::string("FirmwareVersion"),                      // 2Bh
        F::u16("ModuleManufacturerID"),                    // 2Ch
        F::u16("ModuleProductID"),                         // 2Eh
        F::u16("MemorySubsystemControllerManufacturerID"), // 30h
        F::u16("MemorySubsystemControllerProductID"),      // 32h
        F::u64("NonVolatileSize"),                         // 34h
        F::u64("VolatileSize"),                            // 3Ch
        F::u64("CacheSize"),                               // 44h
        F::u64("LogicalSize"),                             // 4Ch
        F::u32("ExtendedSpeed"),                           // 54h
        F::u32("ExtendedConfiguredMemorySpeed"),           // 58h
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            physical_memory_array_handle: f.u16()?,
            memory_error_information_handle: f.u16()?,
            total_width: f.u16()?,
            data_width: f.u16()?,
            size: f.u16()?,
            form_factor: f.u8()?,
            device_set: f.u8()?,
            device_locator: f.string()?,
            bank_locator: f.string()?,
            memory_type: f.u8()?,
            type_detail: MemoryTypeDetail::from_bits_retain(f.u16()?),
            speed: f.u16()?,
            manufacturer: f.string()?,
            serial_number: f.string()?,
            asset_tag: f.string()?,
            part_number: f.string()?,
            attributes: f.u8()?,
            extended_size: f.u32()?,
            configured_memory_speed: f.u16()?,
            minimum_voltage: f.u16()?,
            maximum_voltage: f.u16()?,
            configured_voltage: f.u16()?,
            memory_technology: f.u8()?,
            operating_mode_capability: f.u16()?,
            firmware_version: f.string()?,
            module_manufacturer_id: f.u16()?,
            module_product_id: f.u16()?,
            subsystem_controller_manufacturer_id: f.u16()?,
            subsystem_controller_product_id: f.u16()?,
            non_volatile_size: f.u64()?,
            volatile_size: f.u64()?,
            cache_size: f.u64()?,
            logical_size: f.u64()?,
            extended_speed: f.u32()?,
            extended_configured_memory_speed: f.u32()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::U16(self.physical_memory_array_handle),
            FieldValue::U16(self.memory_error_information_handle),
            FieldValue::U16(self.total_width),
            FieldValue::U16(self.data_width),
            FieldValue::U16(self.size),
            FieldValue::U8(self.form_factor),
            FieldValue::U8(self.device_set),
            FieldValue::Str(self.device_locator.clone()),
            FieldValue::Str(self.bank_locator.clone()),
            FieldValue::U8(self.memory_type),
            FieldValue::U16(self.type_detail.bits()),
            FieldValue::U16(self.speed),
            FieldValue::Str(self.manufacturer.clone()),
            FieldValue::Str(self.serial_number.clone()),
            FieldValue::Str(self.asset_tag.clone()),
            FieldValue::Str(self.part_number.clone()),
            FieldValue::U8(self.attributes),
            FieldValue::U32(self.extended_size),
            FieldValue::U16(self.configured_memory_speed),
            FieldValue::U16(self.minimum_voltage),
            FieldValue::U16(self.maximum_voltage),
            FieldValue::U16(self.configured_voltage),
            FieldValue::U8(self.memory_technology),
            FieldValue::U16(self.operating_mode_capability),
            FieldValue::Str(self.firmware_version.clone()),
            FieldValue::U16(self.module_manufacturer_id),
            FieldValue::U16(self.module_product_id),
            FieldValue::U16(self.subsystem_controller_manufacturer_id),
            FieldValue::U16(self.subsystem_controller_product_id),
            FieldValue::U64(self.non_volatile_size),
            FieldValue::U64(self.volatile_size),
            FieldValue::U64(self.cache_size),
            FieldValue::U64(self.logical_size),
            FieldValue::U32(self.extended_speed),
            FieldValue::U32(self.extended_configured_memory_speed),
        ]
    }
}

struct Width(u16);

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 | 0xffff => f.write_str("Unknown"),
            bits => write!(f, "{} bits", bits),
        }
    }
}

struct Millivolts(u16);

impl fmt::Display for Millivolts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("Unknown"),
            mv if mv % 100 == 0 => write!(f, "{}.{} V", mv / 1000, (mv % 1000) / 100),
            mv => write!(f, "{}.{:03} V", mv / 1000, mv % 1000),
        }
    }
}

/// Transfer rate, deferring to the 32-bit field when the 16-bit one is 0xFFFF.
struct Speed(u16, u32);

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mts = if self.0 == 0xffff { self.1 & 0x7fff_ffff } else { u32::from(self.0) };
        match mts {
            0 => f.write_str("Unknown"),
            v => write!(f, "{} MT/s", v),
        }
    }
}

impl fmt::Display for MemoryDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = usize::from(self.table.header().length);
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tArray Handle: 0x{:04X}", self.physical_memory_array_handle)?;
        match self.memory_error_information_handle {
            0xfffe => write!(f, "\n\tError Information Handle: Not Provided")?,
            0xffff => write!(f, "\n\tError Information Handle: No Error")?,
            h => write!(f, "\n\tError Information Handle: 0x{:04X}", h)?,
        }
        write!(f, "\n\tTotal Width: {}", Width(self.total_width))?;
        write!(f, "\n\tData Width: {}", Width(self.data_width))?;
        match (self.size, self.size_bytes()) {
            (0, _) => write!(f, "\n\tSize: No Module Installed")?,
            (_, None) => write!(f, "\n\tSize: Unknown")?,
            (_, Some(bytes)) => write!(f, "\n\tSize: {}", ByteSize(bytes))?,
        }
        write!(f, "\n\tForm Factor: {}", dense_name(self.form_factor, FORM_FACTORS))?;
        match self.device_set {
            0 => write!(f, "\n\tSet: None")?,
            0xff => write!(f, "\n\tSet: Unknown")?,
            s => write!(f, "\n\tSet: {}", s)?,
        }
        write!(f, "\n\tLocator: {}", self.device_locator)?;
        write!(f, "\n\tBank Locator: {}", self.bank_locator)?;
        write!(f, "\n\tType: {}", dense_name(self.memory_type, MEMORY_TYPES))?;
        write!(f, "\n\tType Detail:")?;
        if self.type_detail.difference(MemoryTypeDetail::RESERVED).is_empty() {
            write!(f, " None")?;
        }
        write_flag_lines(f, self.type_detail, TYPE_DETAIL)?;
        if length >= 0x17 {
            write!(f, "\n\tSpeed: {}", Speed(self.speed, self.extended_speed))?;
        }
        if length >= 0x1b {
            write!(f, "\n\tManufacturer: {}", self.manufacturer)?;
            write!(f, "\n\tSerial Number: {}", self.serial_number)?;
            write!(f, "\n\tAsset Tag: {}", self.asset_tag)?;
            write!(f, "\n\tPart Number: {}", self.part_number)?;
        }
        if length >= 0x1c {
            match self.rank() {
                0 => write!(f, "\n\tRank: Unknown")?,
                r => write!(f, "\n\tRank: {}", r)?,
            }
        }
        if length >= 0x22 {
            write!(
                f,
                "\n\tConfigured Memory Speed: {}",
                Speed(self.configured_memory_speed, self.extended_configured_memory_speed)
            )?;
        }
        if length >= 0x28 {
            write!(f, "\n\tMinimum Voltage: {}", Millivolts(self.minimum_voltage))?;
            write!(f, "\n\tMaximum Voltage: {}", Millivolts(self.maximum_voltage))?;
            write!(f, "\n\tConfigured Voltage: {}", Millivolts(self.configured_voltage))?;
        }
        if length >= 0x29 {
            write!(f, "\n\tMemory Technology: {}", dense_name(self.memory_technology, TECHNOLOGIES))?;
        }
        Ok(())
    }
}
