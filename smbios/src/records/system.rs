//! System Information (Type 1)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::Lookup;
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::cursor::SmbiosString;
use crate::error::Result;
use crate::table::{RawStructure, TableType};

/// System UUID.
///
/// The first three groups are stored little-endian, the last two in
/// network order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uuid(pub [u8; 16]);

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = &self.0;
        if u.iter().all(|&b| b == 0) {
            return f.write_str("Not Settable");
        }
        if u.iter().all(|&b| b == 0xff) {
            return f.write_str("Not Present");
        }
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-",
            u[3], u[2], u[1], u[0], u[5], u[4], u[7], u[6], u[8], u[9]
        )?;
        for b in &u[10..] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

const WAKEUP_TYPES: &[(u8, &str)] = &[
    (0x00, "Reserved"),
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "APM Timer"),
    (0x04, "Modem Ring"),
    (0x05, "LAN Remote"),
    (0x06, "Power Switch"),
    (0x07, "PCI PME#"),
    (0x08, "AC Power Restored"),
];

/// System Information (Type 1)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemInfo {
    pub table: RawStructure,
    pub manufacturer: SmbiosString,
    pub product_name: SmbiosString,
    pub version: SmbiosString,
    pub serial_number: SmbiosString,
    pub uuid: Uuid,
    pub wakeup_type: u8,
    pub sku_number: SmbiosString,
    pub family: SmbiosString,
}

impl Record for SystemInfo {
    const TABLE_TYPE: TableType = TableType::SYSTEM_INFORMATION;
    const NAME: &'static str = "SystemInfo";
    const MIN_LEN: usize = 0x08;
    const FIELDS: &'static [F] = &[
        F::string("Manufacturer"), // 04h
        F::string("ProductName"),  // 05h
        F::string("Version"),      // 06h
        F::string("SerialNumber"), // 07h
        F::bytes("UUID", 16),      // 08h
        F::u8("WakeupType"),       // 18h
        F::string("SKUNumber"),    // 19h
        F::string("Family"),       // 1Ah
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            manufacturer: f.string()?,
            product_name: f.string()?,
            version: f.string()?,
            serial_number: f.string()?,
            uuid: Uuid(f.bytes()?),
            wakeup_type: f.u8()?,
            sku_number: f.string()?,
            family: f.string()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.manufacturer.clone()),
            FieldValue::Str(self.product_name.clone()),
            FieldValue::Str(self.version.clone()),
            FieldValue::Str(self.serial_number.clone()),
            FieldValue::Bytes(self.uuid.0.to_vec()),
            FieldValue::U8(self.wakeup_type),
            FieldValue::Str(self.sku_number.clone()),
            FieldValue::Str(self.family.clone()),
        ]
    }
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = self.table.header().length;
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tManufacturer: {}", self.manufacturer)?;
        write!(f, "\n\tProduct Name: {}", self.product_name)?;
        write!(f, "\n\tVersion: {}", self.version)?;
        write!(f, "\n\tSerial Number: {}", self.serial_number)?;
        if length >= 0x19 {
            write!(f, "\n\tUUID: {}", self.uuid)?;
            write!(f, "\n\tWake-up Type: {}", Lookup { value: self.wakeup_type, names: WAKEUP_TYPES })?;
        }
        if length >= 0x1b {
            write!(f, "\n\tSKU Number: {}", self.sku_number)?;
            write!(f, "\n\tFamily: {}", self.family)?;
        }
        Ok(())
    }
}
