//! System Slots (Type 9)

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use super::{dense_name, write_flag_lines, Lookup};
use crate::codec::{FieldDescriptor as F, FieldValue, Fields, Record, SubCodec};
use crate::cursor::{FieldReader, SmbiosString, TableWriter};
use crate::error::{Error, Result};
use crate::table::{RawStructure, TableType};

bitflags! {
    /// Slot characteristics 1 (offset 0Bh)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SlotCharacteristics1: u8 {
        const UNKNOWN = 1 << 0;
        const PROVIDES_5_0V = 1 << 1;
        const PROVIDES_3_3V = 1 << 2;
        const SHARED = 1 << 3;
        const PC_CARD_16 = 1 << 4;
        const CARDBUS = 1 << 5;
        const ZOOM_VIDEO = 1 << 6;
        const MODEM_RING_RESUME = 1 << 7;
    }
}

bitflags! {
    /// Slot characteristics 2 (offset 0Ch)
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SlotCharacteristics2: u8 {
        const PME = 1 << 0;
        const HOT_PLUG = 1 << 1;
        const SMBUS = 1 << 2;
        const BIFURCATION = 1 << 3;
        const ASYNC_SURPRISE_REMOVAL = 1 << 4;
        const FLEXBUS_CXL1 = 1 << 5;
        const FLEXBUS_CXL2 = 1 << 6;
        const FLEXBUS_CXL3 = 1 << 7;
    }
}

const CHARACTERISTICS1: &[(SlotCharacteristics1, &str)] = &[
    (SlotCharacteristics1::UNKNOWN, "Unknown"),
    (SlotCharacteristics1::PROVIDES_5_0V, "5.0 V is provided"),
    (SlotCharacteristics1::PROVIDES_3_3V, "3.3 V is provided"),
    (SlotCharacteristics1::SHARED, "Opening is shared"),
    (SlotCharacteristics1::PC_CARD_16, "PC Card-16 is supported"),
    (SlotCharacteristics1::CARDBUS, "Cardbus is supported"),
    (SlotCharacteristics1::ZOOM_VIDEO, "Zoom Video is supported"),
    (SlotCharacteristics1::MODEM_RING_RESUME, "Modem ring resume is supported"),
];

const CHARACTERISTICS2: &[(SlotCharacteristics2, &str)] = &[
    (SlotCharacteristics2::PME, "PME signal is supported"),
    (SlotCharacteristics2::HOT_PLUG, "Hot-plug devices are supported"),
    (SlotCharacteristics2::SMBUS, "SMBus signal is supported"),
    (SlotCharacteristics2::BIFURCATION, "PCIe slot bifurcation is supported"),
    (SlotCharacteristics2::ASYNC_SURPRISE_REMOVAL, "Async/surprise removal is supported"),
    (SlotCharacteristics2::FLEXBUS_CXL1, "Flexbus slot, CXL 1.0 capable"),
    (SlotCharacteristics2::FLEXBUS_CXL2, "Flexbus slot, CXL 2.0 capable"),
    (SlotCharacteristics2::FLEXBUS_CXL3, "Flexbus slot, CXL 3.0 capable"),
];

const SLOT_TYPES: &[(u8, &str)] = &[
    (0x01, "Other"),
    (0x02, "Unknown"),
    (0x03, "ISA"),
    (0x04, "MCA"),
    (0x05, "EISA"),
    (0x06, "PCI"),
    (0x07, "PC Card (PCMCIA)"),
    (0x08, "VLB"),
    (0x09, "Proprietary"),
    (0x0a, "Processor Card"),
    (0x0b, "Proprietary Memory Card"),
    (0x0c, "I/O Riser Card"),
    (0x0d, "NuBus"),
    (0x0e, "PCI-66"),
    (0x0f, "AGP"),
    (0x10, "AGP 2x"),
    (0x11, "AGP 4x"),
    (0x12, "PCI-X"),
    (0x13, "AGP 8x"),
    (0x14, "M.2 Socket 1-DP"),
    (0x15, "M.2 Socket 1-SD"),
    (0x16, "M.2 Socket 2"),
    (0x17, "M.2 Socket 3"),
    (0x18, "MXM Type I"),
    (0x19, "MXM Type II"),
    (0x1a, "MXM Type III"),
    (0x1b, "MXM Type III-HE"),
    (0x1c, "MXM Type IV"),
    (0x1d, "MXM 3.0 Type A"),
    (0x1e, "MXM 3.0 Type B"),
    (0x1f, "PCI Express 2 SFF-8639 (U.2)"),
    (0x20, "PCI Express 3 SFF-8639 (U.2)"),
    (0x21, "PCI Express Mini 52-pin with bottom-side keep-outs"),
    (0x22, "PCI Express Mini 52-pin without bottom-side keep-outs"),
    (0x23, "PCI Express Mini 76-pin"),
    (0x24, "PCI Express 4 SFF-8639 (U.2)"),
    (0x25, "PCI Express 5 SFF-8639 (U.2)"),
    (0x26, "OCP NIC 3.0 Small Form Factor (SFF)"),
    (0x27, "OCP NIC 3.0 Large Form Factor (LFF)"),
    (0x28, "OCP NIC Prior to 3.0"),
    (0x30, "CXL FLexbus 1.0"),
    (0xa0, "PC-98/C20"),
    (0xa1, "PC-98/C24"),
    (0xa2, "PC-98/E"),
    (0xa3, "PC-98/Local Bus"),
    (0xa4, "PC-98/Card"),
    (0xa5, "PCI Express"),
    (0xa6, "PCI Express x1"),
    (0xa7, "PCI Express x2"),
    (0xa8, "PCI Express x4"),
    (0xa9, "PCI Express x8"),
    (0xaa, "PCI Express x16"),
    (0xab, "PCI Express 2"),
    (0xac, "PCI Express 2 x1"),
    (0xad, "PCI Express 2 x2"),
    (0xae, "PCI Express 2 x4"),
    (0xaf, "PCI Express 2 x8"),
    (0xb0, "PCI Express 2 x16"),
    (0xb1, "PCI Express 3"),
    (0xb2, "PCI Express 3 x1"),
    (0xb3, "PCI Express 3 x2"),
    (0xb4, "PCI Express 3 x4"),
    (0xb5, "PCI Express 3 x8"),
    (0xb6, "PCI Express 3 x16"),
    (0xb8, "PCI Express 4"),
    (0xb9, "PCI Express 4 x1"),
    (0xba, "PCI Express 4 x2"),
    (0xbb, "PCI Express 4 x4"),
    (0xbc, "PCI Express 4 x8"),
    (0xbd, "PCI Express 4 x16"),
    (0xbe, "PCI Express 5"),
    (0xbf, "PCI Express 5 x1"),
    (0xc0, "PCI Express 5 x2"),
    (0xc1, "PCI Express 5 x4"),
    (0xc2, "PCI Express 5 x8"),
    (0xc3, "PCI Express 5 x16"),
    (0xc4, "PCI Express 6+"),
    (0xc5, "EDSFF E1"),
    (0xc6, "EDSFF E3"),
];

const BUS_WIDTHS: &[&str] = &[
    "Other",
    "Unknown",
    "8-bit",
    "16-bit",
    "32-bit",
    "64-bit",
    "128-bit",
    "x1",
    "x2",
    "x4",
    "x8",
    "x12",
    "x16",
    "x32",
];

const USAGES: &[&str] = &["Other", "Unknown", "Available", "In Use", "Unavailable"];

const LENGTHS: &[&str] = &[
    "Other",
    "Unknown",
    "Short",
    "Long",
    "2.5\" drive form factor",
    "3.5\" drive form factor",
];

/// Encoded size of one peer group
const PEER_GROUP_SIZE: usize = 5;

/// A PCI function sharing the slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeerGroup {
    pub segment_group: u16,
    pub bus: u8,
    /// Device in bits 7:3, function in bits 2:0
    pub device_function: u8,
    pub data_bus_width: u8,
}

impl fmt::Display for PeerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04x}:{:02x}:{:02x}.{:x} (Width {})",
            self.segment_group,
            self.bus,
            self.device_function >> 3,
            self.device_function & 0x07,
            self.data_bus_width
        )
    }
}

/// Count byte followed by that many five-byte peer groups.
#[derive(Debug)]
pub struct PeerGroups;

impl SubCodec for PeerGroups {
    fn decode(&self, reader: &FieldReader<'_>, offset: usize) -> Result<(FieldValue, usize)> {
        let count = usize::from(reader.read_u8(offset)?);
        let mut groups = Vec::with_capacity(count);
        let mut at = offset + 1;
        for _ in 0..count {
            groups.push(FieldValue::Record(vec![
                FieldValue::U16(reader.read_u16(at)?),
                FieldValue::U8(reader.read_u8(at + 2)?),
                FieldValue::U8(reader.read_u8(at + 3)?),
                FieldValue::U8(reader.read_u8(at + 4)?),
            ]));
            at += PEER_GROUP_SIZE;
        }
        Ok((FieldValue::List(groups), at - offset))
    }

    fn encode(&self, value: &FieldValue, writer: &mut TableWriter) -> Result<()> {
        let FieldValue::List(groups) = value else {
            return Err(Error::InvalidArgument("peer groups must be a list"));
        };
        let count = u8::try_from(groups.len()).map_err(|_| Error::InvalidSubField {
            field: "PeerGroups",
            reason: "more than 255 peer groups",
        })?;
        writer.write_u8(count);
        for group in groups {
            let FieldValue::Record(v) = group else {
                return Err(Error::InvalidArgument("malformed peer group"));
            };
            match v.as_slice() {
                [FieldValue::U16(seg), FieldValue::U8(bus), FieldValue::U8(df), FieldValue::U8(w)] => {
                    writer.write_u16(*seg);
                    writer.write_bytes(&[*bus, *df, *w]);
                }
                _ => return Err(Error::InvalidArgument("malformed peer group")),
            }
        }
        Ok(())
    }
}

/// System Slots (Type 9)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSlots {
    pub table: RawStructure,
    pub slot_designation: SmbiosString,
    pub slot_type: u8,
    pub slot_data_bus_width: u8,
    pub current_usage: u8,
    pub slot_length: u8,
    pub slot_id: u16,
    pub characteristics1: SlotCharacteristics1,
    pub characteristics2: SlotCharacteristics2,
    pub segment_group_number: u16,
    pub bus_number: u8,
    pub device_function_number: u8,
    pub data_bus_width: u8,
    pub peer_groups: Vec<PeerGroup>,
    pub slot_information: u8,
    pub slot_physical_width: u8,
    pub slot_pitch: u16,
}

impl Record for SystemSlots {
    const TABLE_TYPE: TableType = TableType::SYSTEM_SLOTS;
    const NAME: &'static str = "SystemSlots";
    const MIN_LEN: usize = 0x0b;
    const FIELDS: &'static [F] = &[
        F::string("SlotDesignation"),           // 04h
        F::u8("SlotType"),                      // 05h
        F::u8("SlotDataBusWidth"),              // 06h
        F::u8("CurrentUsage"),                  // 07h
        F::u8("SlotLength"),                    // 08h
        F::u16("SlotID"),                       // 09h
        F::u8("SlotCharacteristics1"),          // 0Bh
        F::u8("SlotCharacteristics2"),          // 0Ch
        F::u16("SegmentGroupNumber"),           // 0Dh
        F::u8("BusNumber"),                     // 0Fh
        F::u8("DeviceFunctionNumber"),          // 10h
        F::u8("DataBusWidth"),                  // 11h
        F::custom("PeerGroups", &PeerGroups),   // 12h
        F::u8("SlotInformation"),               // 13h + 5n
        F::u8("SlotPhysicalWidth"),             // 14h + 5n
        F::u16("SlotPitch"),                    // 15h + 5n
    ];

    fn from_fields(table: &RawStructure, f: &mut Fields) -> Result<Self> {
        let slot_designation = f.string()?;
        let slot_type = f.u8()?;
        let slot_data_bus_width = f.u8()?;
        let current_usage = f.u8()?;
        let slot_length = f.u8()?;
        let slot_id = f.u16()?;
        let characteristics1 = SlotCharacteristics1::from_bits_retain(f.u8()?);
        let characteristics2 = SlotCharacteristics2::from_bits_retain(f.u8()?);
        let segment_group_number = f.u16()?;
        let bus_number = f.u8()?;
        let device_function_number = f.u8()?;
        let data_bus_width = f.u8()?;
        let mut peer_groups = Vec::new();
        for group in f.list()? {
            let FieldValue::Record(values) = group else {
                return Err(Error::InvalidArgument("malformed peer group"));
            };
            let mut g = Fields::new(Self::NAME, values);
            peer_groups.push(PeerGroup {
                segment_group: g.u16()?,
                bus: g.u8()?,
                device_function: g.u8()?,
                data_bus_width: g.u8()?,
            });
        }
        Ok(Self {
            table: table.clone(),
            slot_designation,
            slot_type,
            slot_data_bus_width,
            current_usage,
            slot_length,
            slot_id,
            characteristics1,
            characteristics2,
            segment_group_number,
            bus_number,
            device_function_number,
            data_bus_width,
            peer_groups,
            slot_information: f.u8()?,
            slot_physical_width: f.u8()?,
            slot_pitch: f.u16()?,
        })
    }

    fn to_fields(&self) -> Vec<FieldValue> {
        let groups = self
            .peer_groups
            .iter()
            .map(|g| {
                FieldValue::Record(vec![
                    FieldValue::U16(g.segment_group),
                    FieldValue::U8(g.bus),
                    FieldValue::U8(g.device_function),
                    FieldValue::U8(g.data_bus_width),
                ])
            })
            .collect();
        vec![
            FieldValue::Str(self.slot_designation.clone()),
            FieldValue::U8(self.slot_type),
            FieldValue::U8(self.slot_data_bus_width),
            FieldValue::U8(self.current_usage),
            FieldValue::U8(self.slot_length),
            FieldValue::U16(self.slot_id),
            FieldValue::U8(self.characteristics1.bits()),
            FieldValue::U8(self.characteristics2.bits()),
            FieldValue::U16(self.segment_group_number),
            FieldValue::U8(self.bus_number),
            FieldValue::U8(self.device_function_number),
            FieldValue::U8(self.data_bus_width),
            FieldValue::List(groups),
            FieldValue::U8(self.slot_information),
            FieldValue::U8(self.slot_physical_width),
            FieldValue::U16(self.slot_pitch),
        ]
    }
}

impl fmt::Display for SystemSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let length = usize::from(self.table.header().length);
        write!(f, "{}", self.table.header())?;
        write!(f, "\n\tDesignation: {}", self.slot_designation)?;
        write!(f, "\n\tType: {}", Lookup { value: self.slot_type, names: SLOT_TYPES })?;
        write!(f, "\n\tData Bus Width: {}", dense_name(self.slot_data_bus_width, BUS_WIDTHS))?;
        write!(f, "\n\tCurrent Usage: {}", dense_name(self.current_usage, USAGES))?;
        write!(f, "\n\tLength: {}", dense_name(self.slot_length, LENGTHS))?;
        write!(f, "\n\tID: {}", self.slot_id)?;
        write!(f, "\n\tCharacteristics:")?;
        if self.characteristics1.is_empty() && self.characteristics2.is_empty() {
            write!(f, " None")?;
        }
        write_flag_lines(f, self.characteristics1, CHARACTERISTICS1)?;
        if length >= 0x0d {
            write_flag_lines(f, self.characteristics2, CHARACTERISTICS2)?;
        }
        if length >= 0x11 {
            write!(
                f,
                "\n\tBus Address: {:04x}:{:02x}:{:02x}.{:x}",
                self.segment_group_number,
                self.bus_number,
                self.device_function_number >> 3,
                self.device_function_number & 0x07
            )?;
        }
        if length >= 0x13 {
            write!(f, "\n\tData Bus Width (Base): {}", self.data_bus_width)?;
            write!(f, "\n\tPeer Devices: {}", self.peer_groups.len())?;
            for g in &self.peer_groups {
                write!(f, "\n\t\t{}", g)?;
            }
        }
        Ok(())
    }
}
