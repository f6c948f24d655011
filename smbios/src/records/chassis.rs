//! System Enclosure or Chassis (Type 3)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::{dense_name, Lookup};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record, SubCodec};
use crate::cursor::{FieldReader, SmbiosString, TableWriter};
use crate::error::{Error, Result};
use crate::table::{RawStructure, TableType};

const CHASSIS_TYPES: &[&str] = &[
    "Other",
    "Unknown",
    "Desktop",
    "Low Profile Desktop",
    "Pizza Box",
    "Mini Tower",
    "Tower",
    "Portable",
    "Laptop",
    "Notebook",
    "Hand Held",
    "Docking Station",
    "All In One",
    "Sub Notebook",
    "Space-saving",
    "Lunch Box",
    "Main Server Chassis",
    "Expansion Chassis",
    "Sub Chassis",
    "Bus Expansion Chassis",
    "Peripheral Chassis",
    "RAID Chassis",
    "Rack Mount Chassis",
    "Sealed-case PC",
    "Multi-system",
    "CompactPCI",
    "AdvancedTCA",
    "Blade",
    "Blade Chassis",
    "Tablet",
    "Convertible",
    "Detachable",
    "IoT Gateway",
    "Embedded PC",
    "Mini PC",
    "Stick PC",
];

const STATES: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "Safe"),
    (0x04, "Warning"),
    (0x05, "Critical"),
    (0x06, "Non-recoverable"),
];

const SECURITY_STATUS: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "None"),
    (0x04, "External Interface Locked Out"),
    (0x05, "External Interface Enabled"),
];

/// Bit 7 of the type byte
const LOCK_PRESENT: u8 = 0x80;

/// Encoded size of one contained element
const ELEMENT_SIZE: u8 = 3;

/// One contained element record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainedElement {
    /// Bit 7 set: SMBIOS structure type; clear: base board type
    pub element_type: u8,
    pub min: u8,
    pub max: u8,
}

impl fmt::Display for ContainedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.element_type & 0x7f;
        if self.element_type & 0x80 != 0 {
            write!(f, "{}", TableType(code))?;
        } else {
            write!(f, "{}", Lookup { value: code, names: super::baseboard::BOARD_TYPES })?;
        }
        write!(f, " {}-{}", self.min, self.max)
    }
}

/// Count byte, element size byte, then `count` three-byte elements.
///
/// A count and size of zero mean no elements; any other size than 3 is
/// rejected.
#[derive(Debug)]
pub struct ContainedElements;

impl SubCodec for ContainedElements {
    fn decode(&self, reader: &FieldReader<'_>, offset: usize) -> Result<(FieldValue, usize)> {
        let count = reader.read_u8(offset)?;
        let size = reader.read_u8(offset + 1)?;
        if count == 0 && size == 0 {
            return Ok((FieldValue::List(Vec::new()), 2));
        }
        if size != ELEMENT_SIZE {
            log::warn!("unexpected chassis contained element size {}", size);
            return Err(Error::InvalidSubField {
                field: "ContainedElements",
                reason: "element size must be 3",
            });
        }
        let mut elements = Vec::with_capacity(usize::from(count));
        let mut at = offset + 2;
        for _ in 0..count {
            let b = reader.read_bytes(at, usize::from(ELEMENT_SIZE))?;
            elements.push(FieldValue::Record(vec![
                FieldValue::U8(b[0]),
                FieldValue::U8(b[1]),
                FieldValue::U8(b[2]),
            ]));
            at += usize::from(ELEMENT_SIZE);
        }
        Ok((FieldValue::List(elements), at - offset))
    }

    fn encode(&self, value: &FieldValue, writer: &mut TableWriter) -> Result<()> {
        let FieldValue::List(elements) = value else {
            return Err(Error::InvalidArgument("contained elements must be a list"));
        };
        let count = u8::try_from(elements.len()).map_err(|_| Error::InvalidSubField {
            field: "ContainedElements",
            reason: "more than 255 elements",
        })?;
        writer.write_u8(count);
        writer.write_u8(if count == 0 { 0 } else { ELEMENT_SIZE });
        for element in elements {
            match element {
                FieldValue::Record(v) => match v.as_slice() {
                    [FieldValue::U8(t), FieldValue::U8(min), FieldValue::U8(max)] => {
                        writer.write_bytes(&[*t, *min, *max]);
                    }
                    _ => return Err(Error::InvalidArgument("malformed contained element")),
                },
                _ => return Err(Error::InvalidArgument("malformed contained element")),
            }
        }
        Ok(())
    }
}

/// System Enclosure or Chassis (Type 3)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChassisInfo {
    pub table: RawStructure,
    pub manufacturer: SmbiosString,
    /// Chassis type; bit 7 is the lock flag
    pub chassis_type: u8,
    pub version: SmbiosString,
    pub serial_number: SmbiosString,
    pub asset_tag: SmbiosString,
    pub bootup_state: u8,
    pub power_supply_state: u8,
    pub thermal_state: u8,
    pub security_status: u8,
    pub oem_info: u32,
    /// Height in rack units, 0 if unspecified
    pub height: u8,
    pub power_cords: u8,
    pub contained_elements: Vec<ContainedElement>,
    pub sku_number: SmbiosString,
}

impl ChassisInfo {
    pub fn lock_present(&self) -> bool {
        self.chassis_type & LOCK_PRESENT != 0
    }

    pub fn type_name(&self) -> &'static str {
        dense_name(self.chassis_type & !LOCK_PRESENT, CHASSIS_TYPES)
    }
}

impl Record for ChassisInfo {
    const TABLE_TYPE: TableType = TableType::CHASSIS_INFORMATION;
    const NAME: &'static str = "ChassisInfo";
    const MIN_LEN: usize = 0x09;
    const FIELDS: &'static [F] = &[
        F::string("Manufacturer"),                          // 04h
        F::u8("Type"),                                      // 05h
        F::string("Version"),                               // 06h
        F::string("SerialNumber"),                          // 07h
        F::string("AssetTagNumber"),                        // 08h
        F::u8("BootupState"),                               // 09h
        F::u8("PowerSupplyState"),                          // 0Ah
        F::u8("ThermalState"),                              // 0Bh
        F::u8("SecurityStatus"),                            // 0Ch
        F::u32("OEMInfo"),                                  // 0Dh
        F::u8("Height"),                                    // 11h
        F::u8("NumberOfPowerCords"),                        // 12h
        F::custom("ContainedElements", &ContainedElements), // 13h
        F::string("SKUNumber"),                             // 15h + n * 3
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        let manufacturer = f.string()?;
        let chassis_type = f.u8()?;
        let version = f.string()?;
        let serial_number = f.string()?;
        let asset_tag = f.string()?;
        let bootup_state = f.u8()?;
        let power_supply_state = f.u8()?;
        let thermal_state = f.u8()?;
        let security_status = f.u8()?;
        let oem_info = f.u32()?;
        let height = f.u8()?;
        let power_cords = f.u8()?;
        let mut contained_elements = Vec::new();
        for element in f.list()? {
            let FieldValue::Record(values) = element else {
                return Err(Error::InvalidArgument("malformed contained element"));
            };
            let mut e = Fields::new(Self::NAME, values);
            contained_elements.push(ContainedElement {
                element_type: e.u8()?,
                min: e.u8()?,
                max: e.u8()?,
            });
        }
        Ok(Self {
            table: table.clone(),
            manufacturer,
            chassis_type,
            version,
            serial_number,
            asset_tag,
            bootup_state,
            power_supply_state,
            thermal_state,
            security_status,
            oem_info,
            height,
            power_cords,
            contained_elements,
            sku_number: f.string()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        let elements = self
            .contained_elements
            .iter()
            .map(|e| {
                FieldValue::Record(vec![
                    FieldValue::U8(e.element_type),
                    FieldValue::U8(e.min),
                    FieldValue::U8(e.max),
                ])
            })
            .collect();
        vec![
            FieldValue::Str(self.manufacturer.clone()),
            FieldValue::U8(self.chassis_type),
            FieldValue::Str(self.version.clone()),
            FieldValue::Str(self.serial_number.clone()),
            FieldValue::Str(self.asset_tag.clone()),
            FieldValue::U8(self.bootup_state),
            FieldValue::U8(self.power_supply_state),
            FieldValue::U8(self.thermal_state),
            FieldValue::U8(self.security_status),
            FieldValue::U32(self.oem_info),
            FieldValue::U8(self.height),
            FieldValue::U8(self.power_cords),
            FieldValue::List(elements),
            FieldValue::Str(self.sku_number.clone()),
        ]
    }
}

impl fmt::Display for ChassisInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = usize::from(self.table.header().length);
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tManufacturer: {}", self.manufacturer)?;
        write!(f, "\n\tType: {}", self.type_name())?;
        write!(f, "\n\tLock: {}", if self.lock_present() { "Present" } else { "Not Present" })?;
        write!(f, "\n\tVersion: {}", self.version)?;
        write!(f, "\n\tSerial Number: {}", self.serial_number)?;
        write!(f, "\n\tAsset Tag: {}", self.asset_tag)?;
        if length >= 0x0d {
            write!(f, "\n\tBoot-up State: {}", Lookup { value: self.bootup_state, names: STATES })?;
            write!(
                f,
                "\n\tPower Supply State: {}",
                Lookup { value: self.power_supply_state, names: STATES }
            )?;
            write!(f, "\n\tThermal State: {}", Lookup { value: self.thermal_state, names: STATES })?;
            write!(
                f,
                "\n\tSecurity Status: {}",
                Lookup { value: self.security_status, names: SECURITY_STATUS }
            )?;
        }
        if length >= 0x11 {
            write!(f, "\n\tOEM Information: 0x{:08X}", self.oem_info)?;
        }
        if length >= 0x13 {
            match self.height {
                0 => write!(f, "\n\tHeight: Unspecified")?,
                h => write!(f, "\n\tHeight: {} U", h)?,
            }
            match self.power_cords {
                0 => write!(f, "\n\tNumber Of Power Cords: Unspecified")?,
                n => write!(f, "\n\tNumber Of Power Cords: {}", n)?,
            }
        }
        if length >= 0x15 {
            write!(f, "\n\tContained Elements: {}", self.contained_elements.len())?;
            for e in &self.contained_elements {
                write!(f, "\n\t\t{}", e)?;
            }
        }
        if length > 0x15 + self.contained_elements.len() * usize::from(ELEMENT_SIZE) {
            write!(f, "\n\tSKU Number: {}", self.sku_number)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::table::Header;

    fn raw(data: &[u8], strings: &[&str]) -> RawStructure {
        RawStructure::new(
            Header {
                table_type: TableType::CHASSIS_INFORMATION,
                length: (data.len() + Header::SIZE) as u8,
                handle: 3,
            },
            data.to_vec(),
            strings.iter().map(|s| s.as_bytes().to_vec()).collect(),
        )
    }

    const HEAD: [u8; 15] = [
        0x01, // manufacturer
        0x97, // rack mount, lock present
        0x00, 0x02, 0x00, // version, serial, asset
        0x03, 0x03, 0x03, 0x03, // states
        0x78, 0x56, 0x34, 0x12, // OEM
        0x02, // height
        0x01, // power cords
    ];

    #[test]
    fn test_contained_elements() {
        let mut data = HEAD.to_vec();
        data.extend_from_slice(&[0x02, 0x03, 0x0a, 0x01, 0x02, 0x84, 0x00, 0x04, 0x03]);
        let t = raw(&data, &["Acme", "SN42", "SKU-1"]);
        let c = ChassisInfo::parse(&t, StringPolicy::Strict).unwrap();

        assert_eq!(c.type_name(), "Rack Mount Chassis");
        assert!(c.lock_present());
        assert_eq!(c.serial_number.as_str(), Some("SN42"));
        assert_eq!(c.oem_info, 0x1234_5678);
        assert_eq!(
            c.contained_elements,
            vec![
                ContainedElement { element_type: 0x0a, min: 1, max: 2 },
                ContainedElement { element_type: 0x84, min: 0, max: 4 },
            ]
        );
        assert_eq!(c.sku_number.as_str(), Some("SKU-1"));

        let text = c.to_string();
        assert!(text.contains("\n\tContained Elements: 2\n\t\tMotherboard 1-2\n\t\tProcessor Information 0-4"));
        assert!(text.contains("\n\tHeight: 2 U"));
        assert!(text.ends_with("\n\tSKU Number: SKU-1"));
    }

    #[test]
    fn test_empty_elements_round_trip() {
        let mut data = HEAD.to_vec();
        data.extend_from_slice(&[0x00, 0x00, 0x00]);
        let t = raw(&data, &["Acme", "SN42"]);
        let c = ChassisInfo::parse(&t, StringPolicy::Strict).unwrap();
        assert!(c.contained_elements.is_empty());
        assert_eq!(c.encode(3).unwrap(), t);
    }

    #[test]
    fn test_bad_element_size() {
        let mut data = HEAD.to_vec();
        data.extend_from_slice(&[0x01, 0x04, 0x0a, 0x01, 0x02, 0x00]);
        let err = ChassisInfo::parse(&raw(&data, &["Acme", "SN42"]), StringPolicy::Strict).unwrap_err();
        assert_eq!(
            err.root(),
            &Error::InvalidSubField { field: "ContainedElements", reason: "element size must be 3" }
        );
    }

    #[test]
    fn test_smbios_2_0_chassis() {
        let t = raw(&HEAD[..5], &["Acme", "SN42"]);
        let c = ChassisInfo::parse(&t, StringPolicy::Strict).unwrap();
        assert_eq!(c.bootup_state, 0);
        assert!(c.contained_elements.is_empty());
        let text = c.to_string();
        assert!(text.ends_with("\n\tAsset Tag: Not Specified"));
    }

    #[test]
    fn test_encode_elements() {
        let c = ChassisInfo {
            chassis_type: 0x03,
            contained_elements: vec![ContainedElement { element_type: 0x09, min: 0, max: 1 }],
            ..Default::default()
        };
        let raw = c.encode(0x10).unwrap();
        assert_eq!(&raw.data()[0x0f..], &[0x01, 0x03, 0x09, 0x00, 0x01, 0x00]);
        assert_eq!(raw.header().length, 0x04 + 0x0f + 6);
    }
}
