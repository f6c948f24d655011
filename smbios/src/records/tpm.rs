//! TPM Device (Type 43)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::write_flag_lines;
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

bitflags! {
    /// TPM device characteristics (offset 13h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TpmCharacteristics: u64 {
        const NOT_SUPPORTED = 1 << 2;
        const FAMILY_CONFIGURABLE_FIRMWARE = 1 << 3;
        const FAMILY_CONFIGURABLE_SOFTWARE = 1 << 4;
        const FAMILY_CONFIGURABLE_OEM = 1 << 5;
    }
}

const CHARACTERISTICS: &[(TpmCharacteristics, &str)] = &[
    (TpmCharacteristics::NOT_SUPPORTED, "TPM Device characteristics not supported"),
    (
        TpmCharacteristics::FAMILY_CONFIGURABLE_FIRMWARE,
        "Family configurable via firmware update",
    ),
    (
        TpmCharacteristics::FAMILY_CONFIGURABLE_SOFTWARE,
        "Family configurable via platform software support",
    ),
    (
        TpmCharacteristics::FAMILY_CONFIGURABLE_OEM,
        "Family configurable via OEM proprietary mechanism",
    ),
];

/// TPM Device (Type 43)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TpmDevice {
    pub table: RawStructure,
    /// ASCII vendor ID, NUL padded
    pub vendor_id: [u8; 4],
    pub major_spec_version: u8,
    pub minor_spec_version: u8,
    pub firmware_version1: u32,
    pub firmware_version2: u32,
    pub description: SmbiosString,
    pub characteristics: TpmCharacteristics,
    pub oem_defined: u32,
}

impl TpmDevice {
    /// Vendor ID up to the first NUL.
    pub fn vendor(&self) -> &str {
        let end = self.vendor_id.iter().position(|&b| b == 0).unwrap_or(self.vendor_id.len());
        core::str::from_utf8(&self.vendor_id[..end]).unwrap_or("")
    }

    /// Firmware revision as (major, minor).
    ///
    /// TPM 1.2 packs the revision into bytes 2 and 3 of the first version
    /// word; TPM 2.0 uses its high and low halves.
    pub fn firmware_revision(&self) -> (u32, u32) {
        let v = self.firmware_version1;
        match self.major_spec_version {
            1 => ((v >> 16) & 0xff, v >> 24),
            _ => (v >> 16, v & 0xffff),
        }
    }
}

impl Record for TpmDevice {
    const TABLE_TYPE: TableType = TableType::TPM_DEVICE;
    const NAME: &'static str = "TPMDevice";
    const MIN_LEN: usize = 0x1f;
    const FIELDS: &'static [F] = &[
        F::bytes("VendorID", 4),       // 04h
        F::u8("MajorSpecVersion"),     // 08h
        F::u8("MinorSpecVersion"),     // 09h
        F::u32("FirmwareVersion1"),    // 0Ah
        F::u32("FirmwareVersion2"),    // 0Eh
        F::string("Description"),      // 12h
        F::u64("Characteristics"),     // 13h
        F::u32("OEMDefined"),          // 1Bh
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            vendor_id: f.bytes::<4>()?,
            major_spec_version: f.u8()?,
            minor_spec_version: f.u8()?,
            firmware_version1: f.u32()?,
            firmware_version2: f.u32()?,
            description: f.string()?,
            characteristics: TpmCharacteristics::from_bits_retain(f.u64()?),
            oem_defined: f.u32()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Bytes(self.vendor_id.to_vec()),
            FieldValue::U8(self.major_spec_version),
            FieldValue::U8(self.minor_spec_version),
            FieldValue::U32(self.firmware_version1),
            FieldValue::U32(self.firmware_version2),
            FieldValue::Str(self.description.clone()),
            FieldValue::U64(self.characteristics.bits()),
            FieldValue::U32(self.oem_defined),
        ]
    }
}

impl fmt::Display for TpmDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fw_major, fw_minor) = self.firmware_revision();
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tVendor ID: {}", self.vendor())?;
        write!(
            f,
            "\n\tSpecification Version: {}.{}",
            self.major_spec_version, self.minor_spec_version
        )?;
        write!(f, "\n\tFirmware Revision: {}.{}", fw_major, fw_minor)?;
        write!(f, "\n\tDescription: {}", self.description)?;
        write!(f, "\n\tCharacteristics:")?;
        write_flag_lines(f, self.characteristics, CHARACTERISTICS)?;
        write!(f, "\n\tOEM-specific Information: 0x{:08X}", self.oem_defined)
    }
}
