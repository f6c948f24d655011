//! Type code dispatch.
//!
//! The registry maps a structure's type code to the function that builds
//! its typed record. Codes without an entry are reported as
//! [`Error::UnsupportedType`]; the collection decoder keeps those
//! structures raw instead of failing the table.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use spin::Once;

pub use crate::codec::StringPolicy;
use crate::codec::Record;
use crate::error::{Error, Result};
use crate::records::{
    BaseboardInfo, BiosInfo, CacheInfo, ChassisInfo, EndOfTable, Inactive, IpmiDeviceInfo,
    MemoryDevice, ProcessorInfo, SystemInfo, SystemSlots, TpmDevice,
};
use crate::table::{RawStructure, TableType, Tables};

// =============================================================================
// OPTIONS
// =============================================================================

/// Collection decode knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// How bad string indices are handled
    pub string_policy: StringPolicy,
    /// Keep structures without a decoder as [`Decoded::Raw`]
    pub keep_unsupported: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { string_policy: StringPolicy::Tolerant, keep_unsupported: true }
    }
}

// =============================================================================
// TYPED RECORDS
// =============================================================================

/// One variant per supported structure type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedRecord {
    Bios(BiosInfo),
    System(SystemInfo),
    Baseboard(BaseboardInfo),
    Chassis(ChassisInfo),
    Processor(ProcessorInfo),
    Cache(CacheInfo),
    SystemSlots(SystemSlots),
    MemoryDevice(MemoryDevice),
    IpmiDevice(IpmiDeviceInfo),
    TpmDevice(TpmDevice),
    Inactive(Inactive),
    EndOfTable(EndOfTable),
}

macro_rules! each_record {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            TypedRecord::Bios($r) => $body,
            TypedRecord::System($r) => $body,
            TypedRecord::Baseboard($r) => $body,
            TypedRecord::Chassis($r) => $body,
            TypedRecord::Processor($r) => $body,
            TypedRecord::Cache($r) => $body,
            TypedRecord::SystemSlots($r) => $body,
            TypedRecord::MemoryDevice($r) => $body,
            TypedRecord::IpmiDevice($r) => $body,
            TypedRecord::TpmDevice($r) => $body,
            TypedRecord::Inactive($r) => $body,
            TypedRecord::EndOfTable($r) => $body,
        }
    };
}

impl TypedRecord {
    /// Structure the record was decoded from.
    pub fn table(&self) -> &RawStructure {
        each_record!(self, r => &r.table)
    }

    pub fn table_type(&self) -> TableType {
        self.table().table_type()
    }

    pub fn handle(&self) -> u16 {
        self.table().handle()
    }

    /// Re-encode with the given handle.
    pub fn encode(&self, handle: u16) -> Result<RawStructure> {
        each_record!(self, r => r.encode(handle))
    }
}

impl fmt::Display for TypedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each_record!(self, r => fmt::Display::fmt(r, f))
    }
}

macro_rules! impl_from_record {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for TypedRecord {
                fn from(r: $ty) -> Self {
                    Self::$variant(r)
                }
            }
        )*
    };
}

impl_from_record!(
    Bios(BiosInfo),
    System(SystemInfo),
    Baseboard(BaseboardInfo),
    Chassis(ChassisInfo),
    Processor(ProcessorInfo),
    Cache(CacheInfo),
    SystemSlots(SystemSlots),
    MemoryDevice(MemoryDevice),
    IpmiDevice(IpmiDeviceInfo),
    TpmDevice(TpmDevice),
    Inactive(Inactive),
    EndOfTable(EndOfTable),
);

/// A structure after collection decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Typed(TypedRecord),
    /// No decoder, or the decoder failed
    Raw(RawStructure),
}

impl Decoded {
    pub fn table(&self) -> &RawStructure {
        match self {
            Self::Typed(r) => r.table(),
            Self::Raw(raw) => raw,
        }
    }

    pub fn typed(&self) -> Option<&TypedRecord> {
        match self {
            Self::Typed(r) => Some(r),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Typed(r) => fmt::Display::fmt(r, f),
            Self::Raw(raw) => fmt::Display::fmt(raw, f),
        }
    }
}

/// A structure that could not be decoded, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub handle: u16,
    pub table_type: TableType,
    pub error: Error,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle 0x{:04X} (type {}): {}", self.handle, self.table_type.0, self.error)
    }
}

/// Result of decoding a whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// One entry per kept structure, in stream order
    pub entries: Vec<Decoded>,
    pub diagnostics: Vec<Diagnostic>,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Builds a typed record from a raw structure, along with the errors the
/// string policy let through.
pub type DecodeFn = fn(&RawStructure, StringPolicy) -> Result<(TypedRecord, Vec<Error>)>;

fn decode_as<R: Record + Into<TypedRecord>>(
    table: &RawStructure,
    policy: StringPolicy,
) -> Result<(TypedRecord, Vec<Error>)> {
    R::parse_tolerated(table, policy).map(|(record, tolerated)| (record.into(), tolerated))
}

static BUILTIN: Once<Registry> = Once::new();

/// Type code to decoder map.
#[derive(Clone, Default)]
pub struct Registry {
    decoders: BTreeMap<TableType, DecodeFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.decoders.keys().map(|t| t.0)).finish()
    }
}

impl Registry {
    /// Registry with no decoders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every record in the catalog.
    pub fn builtin() -> Self {
        let mut r = Self::new();
        r.register_record::<BiosInfo>();
        r.register_record::<SystemInfo>();
        r.register_record::<BaseboardInfo>();
        r.register_record::<ChassisInfo>();
        r.register_record::<ProcessorInfo>();
        r.register_record::<CacheInfo>();
        r.register_record::<SystemSlots>();
        r.register_record::<MemoryDevice>();
        r.register_record::<IpmiDeviceInfo>();
        r.register_record::<TpmDevice>();
        r.register_record::<Inactive>();
        r.register_record::<EndOfTable>();
        r
    }

    /// Process-wide builtin registry, built on first use.
    pub fn shared() -> &'static Registry {
        BUILTIN.call_once(Self::builtin)
    }

    /// Add or replace the decoder for `table_type`, returning the old one.
    pub fn register(&mut self, table_type: TableType, decode: DecodeFn) -> Option<DecodeFn> {
        self.decoders.insert(table_type, decode)
    }

    pub fn register_record<R: Record + Into<TypedRecord>>(&mut self) -> Option<DecodeFn> {
        self.register(R::TABLE_TYPE, decode_as::<R>)
    }

    pub fn contains(&self, table_type: TableType) -> bool {
        self.decoders.contains_key(&table_type)
    }

    /// Registered codes in ascending order.
    pub fn types(&self) -> impl Iterator<Item = TableType> + '_ {
        self.decoders.keys().copied()
    }

    /// Decode one structure.
    pub fn decode_typed(&self, table: &RawStructure, policy: StringPolicy) -> Result<TypedRecord> {
        self.decode_tolerated(table, policy).map(|(record, _)| record)
    }

    /// Decode one structure, also returning the errors `policy` let through.
    pub fn decode_tolerated(
        &self,
        table: &RawStructure,
        policy: StringPolicy,
    ) -> Result<(TypedRecord, Vec<Error>)> {
        match self.decoders.get(&table.table_type()) {
            Some(decode) => decode(table, policy),
            None => Err(Error::UnsupportedType(table.table_type())),
        }
    }

    /// Decode every structure, keeping failures as raw entries.
    ///
    /// No single structure aborts the table. A failed structure is kept raw
    /// with one diagnostic; a structure decoded despite tolerated errors is
    /// kept typed with one diagnostic per error. Unsupported types are
    /// dropped instead of kept when `keep_unsupported` is off.
    pub fn decode_all(&self, tables: &Tables, options: &DecodeOptions) -> DecodeReport {
        let mut report = DecodeReport::default();
        for table in tables {
            match self.decode_tolerated(table, options.string_policy) {
                Ok((record, tolerated)) => {
                    report.diagnostics.extend(tolerated.into_iter().map(|error| Diagnostic {
                        handle: table.handle(),
                        table_type: table.table_type(),
                        error,
                    }));
                    report.entries.push(Decoded::Typed(record));
                }
                Err(Error::UnsupportedType(t)) => {
                    log::debug!("no decoder for type {} at handle 0x{:04X}", t.0, table.handle());
                    if options.keep_unsupported {
                        report.entries.push(Decoded::Raw(table.clone()));
                    }
                }
                Err(error) => {
                    log::warn!("handle 0x{:04X}: {}", table.handle(), error);
                    report.entries.push(Decoded::Raw(table.clone()));
                    report.diagnostics.push(Diagnostic {
                        handle: table.handle(),
                        table_type: table.table_type(),
                        error,
                    });
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    /// BIOS (18 bytes), vendor type 0xC8, System (8 bytes), end of table.
    const STREAM: &[u8] = &[
        0x00, 0x12, 0x00, 0x00, // BIOS header
        0x01, 0x02, 0x00, 0xf0, 0x03, 0xff, // vendor, version, segment, date, rom size
        0x80, 0x98, 0x8b, 0x3f, 0x01, 0x00, 0x00, 0x00, // characteristics
        b'A', 0x00, b'1', 0x00, b'D', 0x00, 0x00,
        0xc8, 0x05, 0x01, 0x00, 0xaa, 0x00, 0x00, // OEM
        0x01, 0x08, 0x02, 0x00, 0x01, 0x00, 0x00, 0x00, // System
        b'S', 0x00, 0x00,
        0x7f, 0x04, 0x03, 0x00, 0x00, 0x00,
    ];

    fn tables() -> Tables {
        Tables::parse(STREAM).unwrap()
    }

    #[test]
    fn test_builtin_types() {
        let codes: Vec<u8> = Registry::builtin().types().map(|t| t.0).collect();
        assert_eq!(codes, [0, 1, 2, 3, 4, 7, 9, 17, 38, 43, 126, 127]);
        assert!(Registry::shared().contains(TableType::TPM_DEVICE));
    }

    #[test]
    fn test_unknown_type_passthrough() {
        let report = Registry::builtin().decode_all(&tables(), &DecodeOptions::default());
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.entries.len(), 4);
        assert!(matches!(report.entries[0], Decoded::Typed(TypedRecord::Bios(_))));
        assert_eq!(report.entries[1], Decoded::Raw(tables().iter().nth(1).unwrap().clone()));
        assert!(matches!(report.entries[2], Decoded::Typed(TypedRecord::System(_))));
        assert!(matches!(report.entries[3], Decoded::Typed(TypedRecord::EndOfTable(_))));

        let Decoded::Typed(TypedRecord::Bios(bios)) = &report.entries[0] else {
            panic!("expected BIOS record");
        };
        assert_eq!(bios.rom_size_bytes(), 0x100_0000);
    }

    #[test]
    fn test_drop_unsupported() {
        let options = DecodeOptions { keep_unsupported: false, ..DecodeOptions::default() };
        let report = Registry::builtin().decode_all(&tables(), &options);
        assert_eq!(report.entries.len(), 3);
    }

    #[test]
    fn test_decode_typed_unsupported() {
        let t = tables();
        let oem = t.iter().nth(1).unwrap();
        assert_eq!(
            Registry::new().decode_typed(oem, StringPolicy::Tolerant),
            Err(Error::UnsupportedType(TableType(0xc8)))
        );
    }

    #[test]
    fn test_failure_is_downgraded() {
        // System structure pointing at string 2 of 1
        let bytes = [0x01, 0x08, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, b'S', 0x00, 0x00];
        let t = Tables::parse(&bytes).unwrap();
        let registry = Registry::builtin();

        let strict = DecodeOptions { string_policy: StringPolicy::Strict, ..DecodeOptions::default() };
        let report = registry.decode_all(&t, &strict);
        assert!(matches!(report.entries[0], Decoded::Raw(_)));
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].handle, 1);
        assert_eq!(
            report.diagnostics[0].error.root(),
            &Error::BadStringIndex { index: 2, count: 1 }
        );

        let report = registry.decode_all(&t, &DecodeOptions::default());
        let Decoded::Typed(TypedRecord::System(si)) = &report.entries[0] else {
            panic!("expected system record");
        };
        assert_eq!(si.manufacturer.to_string(), "<BAD INDEX>");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].handle, 1);
        assert_eq!(report.diagnostics[0].table_type, TableType::SYSTEM_INFORMATION);
        assert_eq!(
            report.diagnostics[0].error.root(),
            &Error::BadStringIndex { index: 2, count: 1 }
        );

        let err = report.entries[0].typed().unwrap().encode(1).unwrap_err();
        assert_eq!(err.root(), &Error::InvalidArgument("string has a bad index"));
    }

    #[test]
    fn test_register_override() {
        fn always_inactive(
            table: &RawStructure,
            _: StringPolicy,
        ) -> Result<(TypedRecord, Vec<Error>)> {
            Ok((TypedRecord::Inactive(Inactive { table: table.clone() }), Vec::new()))
        }
        let mut registry = Registry::builtin();
        assert!(registry.register(TableType(0xc8), always_inactive).is_none());
        let report = registry.decode_all(&tables(), &DecodeOptions::default());
        assert!(matches!(report.entries[1], Decoded::Typed(TypedRecord::Inactive(_))));
    }

    #[test]
    fn test_typed_record_encode() {
        let report = Registry::shared().decode_all(&tables(), &DecodeOptions::default());
        let record = report.entries[2].typed().unwrap();
        assert_eq!(record.table_type(), TableType::SYSTEM_INFORMATION);
        let encoded = record.encode(record.handle()).unwrap();
        // all fields are written, so the 2.0-era structure grows
        assert_eq!(encoded.header().length, 0x1b);
        assert_eq!(&encoded.data()[..4], record.table().data());
        assert_eq!(encoded.strings(), record.table().strings());
        assert!(record.to_string().starts_with("Handle 0x0002, DMI type 1, 8 bytes\nSystem Information"));
    }
}
