//! Generic field codec.
//!
//! Maps an ordered [`FieldDescriptor`] list onto a structure's formatted
//! region. Decoding walks the descriptors with a single forward cursor:
//!
//! - `ignore` fields consume nothing and take their default (or zero)
//! - `skip=N` steps over N bytes before the field is read
//! - the walk stops once the cursor reaches the end of the region
//! - in complete mode, stopping early is an error; otherwise every field
//!   left over takes its default (or zero) and nested records recurse
//!
//! Encoding mirrors the walk and lets [`TableWriter::finish`] enforce the
//! 255-byte structure limit.

mod descriptor;
mod value;

pub use descriptor::{FieldDescriptor, FieldKind};
pub use value::{FieldValue, Fields};

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::cursor::{FieldReader, SmbiosString, TableWriter};
use crate::error::{Error, Result};
use crate::table::{RawStructure, TableType};

// =============================================================================
// POLICY
// =============================================================================

/// What to do with a string index past the end of the string section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringPolicy {
    /// Keep decoding; the field becomes [`SmbiosString::BadIndex`]
    #[default]
    Tolerant,
    /// Fail the structure with [`Error::BadStringIndex`]
    Strict,
}

// =============================================================================
// SUB-CODECS
// =============================================================================

/// A field with its own variable-length encoding.
pub trait SubCodec: fmt::Debug + Sync {
    /// Decode at `offset`, returning the value and the bytes consumed.
    fn decode(&self, reader: &FieldReader<'_>, offset: usize) -> Result<(FieldValue, usize)>;

    fn encode(&self, value: &FieldValue, writer: &mut TableWriter) -> Result<()>;

    /// Value for a structure that ends before this field.
    fn absent(&self) -> FieldValue {
        FieldValue::List(Vec::new())
    }
}

// =============================================================================
// DECODE
// =============================================================================

/// Walks descriptor lists over one formatted region.
///
/// Errors let through by [`StringPolicy::Tolerant`] are kept, in field
/// order, and handed back by [`FieldDecoder::into_tolerated`].
#[derive(Debug)]
pub struct FieldDecoder<'r, 'a> {
    reader: &'r FieldReader<'a>,
    policy: StringPolicy,
    tolerated: Vec<Error>,
}

impl<'r, 'a> FieldDecoder<'r, 'a> {
    pub fn new(reader: &'r FieldReader<'a>, policy: StringPolicy) -> Self {
        Self { reader, policy, tolerated: Vec::new() }
    }

    pub fn tolerated(&self) -> &[Error] {
        &self.tolerated
    }

    pub fn into_tolerated(self) -> Vec<Error> {
        self.tolerated
    }

    /// Decode `fields` starting at `offset`.
    ///
    /// Returns one value per descriptor and the offset after the last byte
    /// consumed.
    pub fn decode(
        &mut self,
        record: &'static str,
        fields: &[FieldDescriptor],
        mut offset: usize,
        complete: bool,
    ) -> Result<(Vec<FieldValue>, usize)> {
        let len = self.reader.len();
        let mut values = Vec::with_capacity(fields.len());

        let mut parsed = 0;
        while parsed < fields.len() && offset < len {
            let field = &fields[parsed];
            if field.ignore {
                values.push(absent_value(field)?);
                parsed += 1;
                continue;
            }
            let at = offset + field.skip;
            if at >= len {
                break;
            }
            let (value, next) =
                self.decode_field(record, field, at).map_err(|e| e.in_field(record, field.name))?;
            values.push(value);
            offset = next;
            parsed += 1;
        }

        if complete && parsed < fields.len() {
            log::debug!("{} incomplete, got {} of {} fields", record, parsed, fields.len());
            return Err(Error::UnexpectedEndOfData { context: record, offset });
        }

        for field in &fields[parsed..] {
            let value = match field.kind {
                FieldKind::Nested { name, fields } if !field.ignore => {
                    FieldValue::Record(self.decode(name, fields, offset, false)?.0)
                }
                _ => absent_value(field).map_err(|e| e.in_field(record, field.name))?,
            };
            values.push(value);
        }

        Ok((values, offset))
    }

    fn decode_field(
        &mut self,
        record: &'static str,
        field: &FieldDescriptor,
        at: usize,
    ) -> Result<(FieldValue, usize)> {
        let r = self.reader;
        let value = match field.kind {
            FieldKind::U8 => FieldValue::U8(r.read_u8(at)?),
            FieldKind::U16 => FieldValue::U16(r.read_u16(at)?),
            FieldKind::U32 => FieldValue::U32(r.read_u32(at)?),
            FieldKind::U64 => FieldValue::U64(r.read_u64(at)?),
            FieldKind::Bytes(n) => FieldValue::Bytes(r.read_bytes(at, n)?.to_vec()),
            FieldKind::Str => FieldValue::Str(self.decode_string(record, field, at)?),
            FieldKind::Nested { name, fields } => {
                let (values, next) = self.decode(name, fields, at, true)?;
                return Ok((FieldValue::Record(values), next));
            }
            FieldKind::Custom(codec) => {
                let (value, consumed) = codec.decode(r, at)?;
                return Ok((value, at + consumed));
            }
        };
        let width = field.kind.width().unwrap_or(0);
        Ok((value, at + width))
    }

    fn decode_string(
        &mut self,
        record: &'static str,
        field: &FieldDescriptor,
        at: usize,
    ) -> Result<SmbiosString> {
        let index = self.reader.read_u8(at)?;
        match self.reader.resolve_string(index) {
            Err(err @ Error::BadStringIndex { .. }) => match self.policy {
                StringPolicy::Strict => Err(err),
                StringPolicy::Tolerant => {
                    log::warn!("{}.{}: {}", record, field.name, err);
                    self.tolerated.push(err.in_field(record, field.name));
                    Ok(SmbiosString::BadIndex(index))
                }
            },
            other => other,
        }
    }
}

/// Value of a field whose bytes are not present.
fn absent_value(field: &FieldDescriptor) -> Result<FieldValue> {
    const TOO_WIDE: Error = Error::InvalidArgument("default value does not fit field");

    let default = field.default.unwrap_or(0);
    Ok(match field.kind {
        FieldKind::U8 => FieldValue::U8(u8::try_from(default).map_err(|_| TOO_WIDE)?),
        FieldKind::U16 => FieldValue::U16(u16::try_from(default).map_err(|_| TOO_WIDE)?),
        FieldKind::U32 => FieldValue::U32(u32::try_from(default).map_err(|_| TOO_WIDE)?),
        FieldKind::U64 => FieldValue::U64(default),
        FieldKind::Str => FieldValue::Str(SmbiosString::NotSpecified),
        FieldKind::Bytes(_) if field.default.is_some() => {
            return Err(Error::InvalidArgument("array does not support default values"));
        }
        FieldKind::Bytes(n) => FieldValue::Bytes(vec![0; n]),
        FieldKind::Nested { fields, .. } => FieldValue::Record(
            fields.iter().map(absent_value).collect::<Result<Vec<_>>>()?,
        ),
        FieldKind::Custom(codec) => codec.absent(),
    })
}

// =============================================================================
// ENCODE
// =============================================================================

/// Write `values` (one per descriptor) through `writer`.
pub fn encode_fields(
    record: &'static str,
    fields: &[FieldDescriptor],
    values: &[FieldValue],
    writer: &mut TableWriter,
) -> Result<()> {
    if fields.len() != values.len() {
        log::error!("{}: {} values for {} fields", record, values.len(), fields.len());
        return Err(Error::InvalidArgument("record has a different number of values than fields"));
    }
    for (field, value) in fields.iter().zip(values) {
        if field.ignore {
            continue;
        }
        writer.write_zeros(field.skip);
        encode_field(field, value, writer).map_err(|e| e.in_field(record, field.name))?;
    }
    Ok(())
}

fn encode_field(field: &FieldDescriptor, value: &FieldValue, w: &mut TableWriter) -> Result<()> {
    match (field.kind, value) {
        (FieldKind::U8, FieldValue::U8(v)) => w.write_u8(*v),
        (FieldKind::U16, FieldValue::U16(v)) => w.write_u16(*v),
        (FieldKind::U32, FieldValue::U32(v)) => w.write_u32(*v),
        (FieldKind::U64, FieldValue::U64(v)) => w.write_u64(*v),
        (FieldKind::Str, FieldValue::Str(s)) => w.write_string(s)?,
        (FieldKind::Bytes(n), FieldValue::Bytes(b)) if b.len() == n => w.write_bytes(b),
        (FieldKind::Nested { name, fields }, FieldValue::Record(values)) => {
            encode_fields(name, fields, values, w)?;
        }
        (FieldKind::Custom(codec), value) => codec.encode(value, w)?,
        _ => return Err(Error::InvalidArgument("field value does not match layout")),
    }
    Ok(())
}

// =============================================================================
// RECORDS
// =============================================================================

/// A typed structure described by a field layout.
pub trait Record: Sized {
    const TABLE_TYPE: TableType;
    /// Name used in diagnostics
    const NAME: &'static str;
    /// Smallest valid length (header included)
    const MIN_LEN: usize;
    const FIELDS: &'static [FieldDescriptor];

    /// Build from decoded values taken in `FIELDS` order.
    fn from_fields(table: &RawStructure, fields: &mut Fields) -> Result<Self>;

    /// Values in `FIELDS` order.
    fn to_fields(&self) -> Vec<FieldValue>;

    /// Check type and minimum length, then decode with defaults for
    /// fields past the end of the structure.
    fn parse(table: &RawStructure, policy: StringPolicy) -> Result<Self> {
        Self::parse_tolerated(table, policy).map(|(record, _)| record)
    }

    /// [`Record::parse`], also returning the errors `policy` let through.
    fn parse_tolerated(table: &RawStructure, policy: StringPolicy) -> Result<(Self, Vec<Error>)> {
        if table.table_type() != Self::TABLE_TYPE {
            return Err(Error::UnexpectedTableType {
                expected: Self::TABLE_TYPE,
                found: table.table_type(),
            });
        }
        if table.len() < Self::MIN_LEN {
            return Err(Error::UnexpectedEndOfData { context: Self::NAME, offset: table.len() });
        }
        let reader = table.reader();
        let mut decoder = FieldDecoder::new(&reader, policy);
        let (values, _) = decoder.decode(Self::NAME, Self::FIELDS, 0, false)?;
        let record = Self::from_fields(table, &mut Fields::new(Self::NAME, values))?;
        Ok((record, decoder.into_tolerated()))
    }

    /// Encode as a raw structure with the given handle.
    fn encode(&self, handle: u16) -> Result<RawStructure> {
        let mut writer = TableWriter::new();
        encode_fields(Self::NAME, Self::FIELDS, &self.to_fields(), &mut writer)?;
        writer.finish(Self::TABLE_TYPE, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOBAR: &[FieldDescriptor] = &[FieldDescriptor::u8("Foo").default_value(0xe)];

    const SOME_STRUCT: &[FieldDescriptor] = &[
        FieldDescriptor::u64("Off0"),
        FieldDescriptor::u8("Off8"),
        FieldDescriptor::string("Off9"),
        FieldDescriptor::u8("Unused").ignored(),
        FieldDescriptor::u16("Off10"),
        FieldDescriptor::u8("Off14").skip(2),
        FieldDescriptor::u8("Unused2").ignored(),
        FieldDescriptor::u8("Off15").skip(2).default_value(0x1),
        FieldDescriptor::u8("Off17").default_value(0xf),
        FieldDescriptor::nested("Off18", "foobar", FOOBAR),
    ];

    fn decode(
        data: &[u8],
        strings: &[Vec<u8>],
        fields: &[FieldDescriptor],
        complete: bool,
        policy: StringPolicy,
    ) -> Result<(Vec<FieldValue>, usize)> {
        let reader = FieldReader::new(data, strings);
        FieldDecoder::new(&reader, policy).decode("test", fields, 0, complete)
    }

    #[test]
    fn test_walk_with_skip_ignore_and_defaults() {
        let data = [
            0x1, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, // Off0
            0xff, // Off8
            0x1,  // Off9
            0x2, 0x1, // Off10
            0xff, 0xff, // skipped
            0x5,  // Off14
        ];
        let strings = [b"foobar".to_vec()];
        let (values, offset) =
            decode(&data, &strings, SOME_STRUCT, false, StringPolicy::Tolerant).unwrap();

        assert_eq!(offset, data.len());
        assert_eq!(
            values,
            vec![
                FieldValue::U64(1),
                FieldValue::U8(0xff),
                FieldValue::Str(SmbiosString::from("foobar")),
                FieldValue::U8(0),
                FieldValue::U16(0x102),
                FieldValue::U8(0x05),
                FieldValue::U8(0),
                FieldValue::U8(0x1),
                FieldValue::U8(0xf),
                FieldValue::Record(vec![FieldValue::U8(0xe)]),
            ]
        );
    }

    #[test]
    fn test_complete_mode_rejects_short_region() {
        let data = [0x1, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xff];
        let err = decode(&data, &[], SOME_STRUCT, true, StringPolicy::Tolerant).unwrap_err();
        assert_eq!(err, Error::UnexpectedEndOfData { context: "test", offset: 9 });
    }

    #[test]
    fn test_straddling_field_is_an_error() {
        // Off10 needs two bytes, only one left.
        let data = [0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x2];
        let err = decode(&data, &[], SOME_STRUCT, false, StringPolicy::Tolerant).unwrap_err();
        assert!(err.is_truncation());
        assert!(matches!(err, Error::Field { field: "Off10", .. }));
    }

    #[test]
    fn test_nested_record_reads_inline() {
        let data = [
            0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, // Off0..Off10
            0x0, 0x0, 0x7, // skip, Off14
            0x0, 0x0, 0x8, // skip, Off15
            0x9, // Off17
            0x42, // Off18.Foo
        ];
        let (values, offset) = decode(&data, &[], SOME_STRUCT, true, StringPolicy::Tolerant).unwrap();
        assert_eq!(offset, data.len());
        assert_eq!(values[7], FieldValue::U8(0x8));
        assert_eq!(values[9], FieldValue::Record(vec![FieldValue::U8(0x42)]));
    }

    #[test]
    fn test_array_default_is_rejected() {
        const BAD: &[FieldDescriptor] = &[
            FieldDescriptor::u8("A"),
            FieldDescriptor::bytes("Id", 4).default_value(1),
        ];
        const GOOD: &[FieldDescriptor] = &[FieldDescriptor::u8("A"), FieldDescriptor::bytes("Id", 4)];

        let err = decode(&[0x1], &[], BAD, false, StringPolicy::Tolerant).unwrap_err();
        assert_eq!(err.root(), &Error::InvalidArgument("array does not support default values"));

        let (values, _) = decode(&[0x1], &[], GOOD, false, StringPolicy::Tolerant).unwrap();
        assert_eq!(values[1], FieldValue::Bytes(vec![0; 4]));
    }

    #[test]
    fn test_bad_string_index_policies() {
        const LAYOUT: &[FieldDescriptor] =
            &[FieldDescriptor::string("Vendor"), FieldDescriptor::u8("After")];
        let data = [0x3, 0x7];
        let strings = [b"only".to_vec()];

        let reader = FieldReader::new(&data, &strings);
        let mut decoder = FieldDecoder::new(&reader, StringPolicy::Tolerant);
        let (values, offset) = decoder.decode("test", LAYOUT, 0, false).unwrap();
        assert_eq!(offset, 2);
        assert_eq!(values[0], FieldValue::Str(SmbiosString::BadIndex(3)));
        assert_eq!(values[1], FieldValue::U8(0x7));
        let tolerated = decoder.into_tolerated();
        assert_eq!(tolerated.len(), 1);
        assert!(matches!(tolerated[0], Error::Field { record: "test", field: "Vendor", .. }));
        assert_eq!(tolerated[0].root(), &Error::BadStringIndex { index: 3, count: 1 });

        let err = decode(&data, &strings, LAYOUT, false, StringPolicy::Strict).unwrap_err();
        assert_eq!(err.root(), &Error::BadStringIndex { index: 3, count: 1 });
    }

    #[test]
    fn test_default_wider_than_field() {
        const LAYOUT: &[FieldDescriptor] =
            &[FieldDescriptor::u8("First"), FieldDescriptor::u16("Wide").default_value(0x1_0000)];
        let err = decode(&[0x1], &[], LAYOUT, false, StringPolicy::Tolerant).unwrap_err();
        assert!(matches!(err, Error::Field { field: "Wide", .. }));
        assert_eq!(err.root(), &Error::InvalidArgument("default value does not fit field"));
    }

    #[test]
    fn test_encode_mirrors_decode() {
        let values = vec![
            FieldValue::U64(1),
            FieldValue::U8(0xff),
            FieldValue::Str(SmbiosString::from("foobar")),
            FieldValue::U8(0xaa), // ignored
            FieldValue::U16(0x102),
            FieldValue::U8(0x05),
            FieldValue::U8(0xbb), // ignored
            FieldValue::U8(0x1),
            FieldValue::U8(0xf),
            FieldValue::Record(vec![FieldValue::U8(0xe)]),
        ];
        let mut w = TableWriter::new();
        encode_fields("test", SOME_STRUCT, &values, &mut w).unwrap();
        let raw = w.finish(TableType(0x80), 0).unwrap();
        assert_eq!(
            raw.data(),
            &[1, 0, 0, 0, 0, 0, 0, 0, 0xff, 1, 0x02, 0x01, 0, 0, 0x05, 0, 0, 0x1, 0xf, 0xe]
        );
        assert_eq!(raw.strings(), &[b"foobar".to_vec()]);

        let reader = raw.reader();
        let (decoded, _) = FieldDecoder::new(&reader, StringPolicy::Strict)
            .decode("test", SOME_STRUCT, 0, true)
            .unwrap();
        assert_eq!(decoded[4], values[4]);
        assert_eq!(decoded[9], values[9]);
        assert_eq!(decoded[3], FieldValue::U8(0));
    }

    #[test]
    fn test_encode_rejects_mismatched_values() {
        let mut w = TableWriter::new();
        let err = encode_fields("test", FOOBAR, &[FieldValue::U16(1)], &mut w).unwrap_err();
        assert!(matches!(err, Error::Field { field: "Foo", .. }));
        assert!(encode_fields("test", FOOBAR, &[], &mut w).is_err());
    }

    #[test]
    fn test_encode_rejects_oversized_record() {
        const WIDE: &[FieldDescriptor] = &[
            FieldDescriptor::bytes("Blob", 200),
            FieldDescriptor::u64("Tail").skip(44),
        ];
        let mut w = TableWriter::new();
        encode_fields("test", WIDE, &[FieldValue::Bytes(vec![0; 200]), FieldValue::U64(0)], &mut w)
            .unwrap();
        assert_eq!(w.len(), 252);
        assert_eq!(
            w.finish(TableType(0x80), 0).unwrap_err(),
            Error::InvalidArgument("structure too long")
        );
    }
}
