//! Decoded field values and positional extraction.

use alloc::vec::Vec;

use crate::cursor::SmbiosString;
use crate::error::{Error, Result};

/// A decoded field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Str(SmbiosString),
    Bytes(Vec<u8>),
    /// Values of a nested record, in descriptor order
    Record(Vec<FieldValue>),
    /// Items produced by a sub-codec
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Record(_) => "record",
            Self::List(_) => "list",
        }
    }
}

impl From<SmbiosString> for FieldValue {
    fn from(s: SmbiosString) -> Self {
        Self::Str(s)
    }
}

/// Consumes decoded values in descriptor order.
///
/// Record constructors pull one value per descriptor; a value of the wrong
/// kind means the constructor and its layout disagree.
#[derive(Debug)]
pub struct Fields {
    record: &'static str,
    values: alloc::vec::IntoIter<FieldValue>,
}

impl Fields {
    pub fn new(record: &'static str, values: Vec<FieldValue>) -> Self {
        Self { record, values: values.into_iter() }
    }

    /// Values not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    pub fn next_value(&mut self) -> Result<FieldValue> {
        self.values.next().ok_or(Error::InvalidArgument("record has fewer values than fields"))
    }

    fn mismatch(&self, want: &'static str, got: &FieldValue) -> Error {
        log::error!("{}: expected {} value, got {}", self.record, want, got.kind_name());
        Error::InvalidArgument("field value does not match layout")
    }

    pub fn u8(&mut self) -> Result<u8> {
        match self.next_value()? {
            FieldValue::U8(v) => Ok(v),
            other => Err(self.mismatch("u8", &other)),
        }
    }

    pub fn u16(&mut self) -> Result<u16> {
        match self.next_value()? {
            FieldValue::U16(v) => Ok(v),
            other => Err(self.mismatch("u16", &other)),
        }
    }

    pub fn u32(&mut self) -> Result<u32> {
        match self.next_value()? {
            FieldValue::U32(v) => Ok(v),
            other => Err(self.mismatch("u32", &other)),
        }
    }

    pub fn u64(&mut self) -> Result<u64> {
        match self.next_value()? {
            FieldValue::U64(v) => Ok(v),
            other => Err(self.mismatch("u64", &other)),
        }
    }

    pub fn string(&mut self) -> Result<SmbiosString> {
        match self.next_value()? {
            FieldValue::Str(v) => Ok(v),
            other => Err(self.mismatch("string", &other)),
        }
    }

    pub fn bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        match self.next_value()? {
            FieldValue::Bytes(v) if v.len() == N => {
                let mut out = [0u8; N];
                out.copy_from_slice(&v);
                Ok(out)
            }
            other => Err(self.mismatch("byte array", &other)),
        }
    }

    pub fn record(&mut self) -> Result<Fields> {
        match self.next_value()? {
            FieldValue::Record(v) => Ok(Fields::new(self.record, v)),
            other => Err(self.mismatch("record", &other)),
        }
    }

    pub fn list(&mut self) -> Result<Vec<FieldValue>> {
        match self.next_value()? {
            FieldValue::List(v) => Ok(v),
            other => Err(self.mismatch("list", &other)),
        }
    }
}
