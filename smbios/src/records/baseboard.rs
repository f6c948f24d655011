//! Base Board Information (Type 2)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{write_flag_lines, Lookup};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record, SubCodec};
use crate::cursor::{FieldReader, SmbiosString, TableWriter};
use crate::error::{Error, Result};
use crate::table::{RawStructure, TableType};

bitflags! {
    /// Feature flags (offset 09h)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct BoardFeatures: u8 {
        const HOSTING_BOARD = 1 << 0;
        const REQUIRES_DAUGHTER_BOARD = 1 << 1;
        const REMOVABLE = 1 << 2;
        const REPLACEABLE = 1 << 3;
        const HOT_SWAPPABLE = 1 << 4;
    }
}

const FEATURES: &[(BoardFeatures, &str)] = &[
    (BoardFeatures::HOSTING_BOARD, "Board is a hosting board"),
    (BoardFeatures::REQUIRES_DAUGHTER_BOARD, "Board requires at least one daughter board"),
    (BoardFeatures::REMOVABLE, "Board is removable"),
    (BoardFeatures::REPLACEABLE, "Board is replaceable"),
    (BoardFeatures::HOT_SWAPPABLE, "Board is hot swappable"),
];

pub(crate) const BOARD_TYPES: &[(u8, &str)] = &[
    (0x01, "Unknown"),
    (0x02, "Other"),
    (0x03, "Server Blade"),
    (0x04, "Connectivity Switch"),
    (0x05, "System Management Module"),
    (0x06, "Processor Module"),
    (0x07, "I/O Module"),
    (0x08, "Memory Module"),
    (0x09, "Daughter board"),
    (0x0a, "Motherboard"),
    (0x0b, "Processor/Memory Module"),
    (0x0c, "Processor/IO Module"),
    (0x0d, "Interconnect board"),
];

/// Count byte followed by that many 16-bit handles.
#[derive(Debug)]
pub struct ObjectHandles;

impl SubCodec for ObjectHandles {
    fn decode(&self, reader: &FieldReader<'_>, offset: usize) -> Result<(FieldValue, usize)> {
        let count = usize::from(reader.read_u8(offset)?);
        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            handles.push(FieldValue::U16(reader.read_u16(offset + 1 + 2 * i)?));
        }
        Ok((FieldValue::List(handles), 1 + 2 * count))
    }

    fn encode(&self, value: &FieldValue, writer: &mut TableWriter) -> Result<()> {
        let FieldValue::List(handles) = value else {
            return Err(Error::InvalidArgument("object handles must be a list"));
        };
        let count = u8::try_from(handles.len()).map_err(|_| Error::InvalidSubField {
            field: "ObjectHandles",
            reason: "more than 255 handles",
        })?;
        writer.write_u8(count);
        for handle in handles {
            match handle {
                FieldValue::U16(h) => writer.write_u16(*h),
                _ => return Err(Error::InvalidArgument("object handle must be u16")),
            }
        }
        Ok(())
    }
}

/// Base Board Information (Type 2)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseboardInfo {
    pub table: RawStructure,
    pub manufacturer: SmbiosString,
    pub product: SmbiosString,
    pub version: SmbiosString,
    pub serial_number: SmbiosString,
    pub asset_tag: SmbiosString,
    pub features: BoardFeatures,
    pub location_in_chassis: SmbiosString,
    pub chassis_handle: u16,
    pub board_type: u8,
    pub object_handles: Vec<u16>,
}

impl Record for BaseboardInfo {
    const TABLE_TYPE: TableType = TableType::BASEBOARD_INFORMATION;
    const NAME: &'static str = "BaseboardInfo";
    const MIN_LEN: usize = 0x08;
    const FIELDS: &'static [F] = &[
        F::string("Manufacturer"),
        F::string("Product"),
        F::string("Version"),
        F::string("SerialNumber"),
        F::string("AssetTag"),
        F::u8("BoardFeatures"),
        F::string("LocationInChassis"),
        F::u16("ChassisHandle"),
        F::u8("BoardType"),
        F::custom("ObjectHandles", &ObjectHandles),
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        Ok(Self {
            table: table.clone(),
            manufacturer: f.string()?,
            product: f.string()?,
            version: f.string()?,
            serial_number: f.string()?,
            asset_tag: f.string()?,
            features: BoardFeatures::from_bits_retain(f.u8()?),
            location_in_chassis: f.string()?,
            chassis_handle: f.u16()?,
            board_type: f.u8()?,
            object_handles: f
                .list()?
                .into_iter()
                .map(|v| match v {
                    FieldValue::U16(h) => Ok(h),
                    _ => Err(Error::InvalidArgument("object handle must be u16")),
                })
                .collect::<Result<_>>()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Str(self.manufacturer.clone()),
            FieldValue::Str(self.product.clone()),
            FieldValue::Str(self.version.clone()),
            FieldValue::Str(self.serial_number.clone()),
            FieldValue::Str(self.asset_tag.clone()),
            FieldValue::U8(self.features.bits()),
            FieldValue::Str(self.location_in_chassis.clone()),
            FieldValue::U16(self.chassis_handle),
            FieldValue::U8(self.board_type),
            FieldValue::List(self.object_handles.iter().copied().map(FieldValue::U16).collect()),
        ]
    }
}

impl fmt::Display for BaseboardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tManufacturer: {}", self.manufacturer)?;
        write!(f, "\n\tProduct Name: {}", self.product)?;
        write!(f, "\n\tVersion: {}", self.version)?;
        write!(f, "\n\tSerial Number: {}", self.serial_number)?;
        write!(f, "\n\tAsset Tag: {}", self.asset_tag)?;
        write!(f, "\n\tFeatures:")?;
        if self.features.is_empty() {
            write!(f, " None")?;
        }
        write_flag_lines(f, self.features, FEATURES)?;
        write!(f, "\n\tLocation In Chassis: {}", self.location_in_chassis)?;
        write!(f, "\n\tChassis Handle: 0x{:04X}", self.chassis_handle)?;
        write!(f, "\n\tType: {}", Lookup { value: self.board_type, names: BOARD_TYPES })?;
        write!(f, "\n\tContained Object Handles: {}", self.object_handles.len())?;
        for h in &self.object_handles {
            write!(f, "\n\t\t0x{:04X}", h)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::table::Tables;

    const BOARD: [u8; 28] = [
        0x02, 0x13, 0x02, 0x00, // header
        0x01, 0x02, 0x00, 0x00, 0x00, // strings
        0x09, // features
        0x00, // location
        0x03, 0x00, // chassis handle
        0x0a, // board type
        0x02, 0x10, 0x00, 0x11, 0x00, // object handles
        b'A', b'c', b'm', b'e', 0x00, b'X', b'9', 0x00, 0x00,
    ];

    fn board() -> BaseboardInfo {
        let tables = Tables::parse(&BOARD).unwrap();
        BaseboardInfo::parse(tables.iter().next().unwrap(), StringPolicy::Strict).unwrap()
    }

    #[test]
    fn test_parse_with_object_handles() {
        let b = board();
        assert_eq!(b.manufacturer.as_str(), Some("Acme"));
        assert_eq!(b.product.as_str(), Some("X9"));
        assert_eq!(b.features, BoardFeatures::HOSTING_BOARD | BoardFeatures::REPLACEABLE);
        assert_eq!(b.chassis_handle, 3);
        assert_eq!(b.board_type, 0x0a);
        assert_eq!(b.object_handles, vec![0x10, 0x11]);
    }

    #[test]
    fn test_truncated_handle_list() {
        let raw = RawStructure::new(
            crate::table::Header { table_type: TableType(2), length: 0x11, handle: 0 },
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02, 0x10, 0x00],
            Vec::new(),
        );
        let err = BaseboardInfo::parse(&raw, StringPolicy::Strict).unwrap_err();
        assert!(matches!(err, Error::Field { field: "ObjectHandles", .. }));
    }

    #[test]
    fn test_encode_round_trip() {
        let b = board();
        let raw = b.encode(0x0002).unwrap();
        assert_eq!(raw.to_bytes(), &BOARD[..]);
        assert_eq!(raw.strings(), &[b"Acme".to_vec(), b"X9".to_vec()]);
    }

    #[test]
    fn test_display() {
        let text = board().to_string();
        assert!(text.contains("\n\tFeatures:\n\t\tBoard is a hosting board\n\t\tBoard is replaceable"));
        assert!(text.contains("\n\tType: Motherboard"));
        assert!(text.ends_with("\n\tContained Object Handles: 2\n\t\t0x0010\n\t\t0x0011"));
    }
}
