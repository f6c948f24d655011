//! IPMI Device Information (Type 38)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record};
use crate::error::Result;
use crate::table::{RawStructure, TableType};

const INTERFACE_TYPES: &[&str] = &[
    "Unknown",
    "KCS (Keyboard Control Style)",
    "SMIC (Server Management Interface Chip)",
    "BT (Block Transfer)",
    "SSIF (SMBus System Interface)",
];

/// IPMI Device Information (Type 38)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpmiDeviceInfo {
    pub table: RawStructure,
    pub interface_type: u8,
    /// Major in bits 7:4, minor in bits 3:0
    pub specification_revision: u8,
    pub i2c_target_address: u8,
    /// 0xFF if not present
    pub nv_storage_device_address: u8,
    /// Bit 0 set for I/O space
    pub base_address: u64,
    pub base_address_modifier: u8,
    pub interrupt_number: u8,
}

impl IpmiDeviceInfo {
    pub fn io_space(&self) -> bool {
        self.base_address & 1 != 0
    }

    /// Base address with the LS-bit from the modifier applied.
    pub fn address(&self) -> u64 {
        (self.base_address & !1) | u64::from((self.base_address_modifier >> 4) & 1)
    }
}

impl Record for IpmiDeviceInfo {
    const TABLE_TYPE: TableType = TableType::IPMI_DEVICE_INFORMATION;
    const NAME: &'static str = "IPMIDeviceInfo";
    const MIN_LEN: usize = 0x10;
    const FIELDS: &'static [F] = &[
        F::u8("InterfaceType"),
        F::u8("IPMISpecificationRevision"),
        F::u8("I2CTargetAddress"),
        F::u8("NVStorageDeviceAddress"),
        F::u64("BaseAddress"),
        F::u8("BaseAddressModifier"),
        F::u8("InterruptNumber"),
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            interface_type: f.u8()?,
            specification_revision: f.u8()?,
            i2c_target_address: f.u8()?,
            nv_storage_device_address: f.u8()?,
            base_address: f.u64()?,
            base_address_modifier: f.u8()?,
            interrupt_number: f.u8()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::U8(self.interface_type),
            FieldValue::U8(self.specification_revision),
            FieldValue::U8(self.i2c_target_address),
            FieldValue::U8(self.nv_storage_device_address),
            FieldValue::U64(self.base_address),
            FieldValue::U8(self.base_address_modifier),
            FieldValue::U8(self.interrupt_number),
        ]
    }
}

impl fmt::Display for IpmiDeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let interface = usize::from(self.interface_type);
        write!(f, "{}", self.table.header())?;
        write!(
            f,
            "\n\tInterface Type: {}",
            INTERFACE_TYPES.get(interface).copied().unwrap_or(super::OUT_OF_SPEC)
        )?;
        write!(
            f,
            "\n\tSpecification Version: {}.{}",
            self.specification_revision >> 4,
            self.specification_revision & 0x0f
        )?;
        write!(f, "\n\tI2C Target Address: 0x{:02x}", self.i2c_target_address >> 1)?;
        match self.nv_storage_device_address {
            0xff => write!(f, "\n\tNV Storage Device: Not Present")?,
            a => write!(f, "\n\tNV Storage Device Address: {}", a)?,
        }
        write!(
            f,
            "\n\tBase Address: 0x{:016X} ({})",
            self.address(),
            if self.io_space() { "I/O" } else { "Memory-mapped" }
        )?;
        if self.table.header().length >= 0x12 {
            let spacing = match self.base_address_modifier >> 6 {
                0 => "Successive Byte Boundaries",
                1 => "32-bit Boundaries",
                2 => "16-byte Boundaries",
                _ => super::OUT_OF_SPEC,
            };
            write!(f, "\n\tRegister Spacing: {}", spacing)?;
            match self.interrupt_number {
                0 => write!(f, "\n\tInterrupt Number: Unspecified")?,
                n => write!(f, "\n\tInterrupt Number: {}", n)?,
            }
        }
        Ok(())
    }
}
