//! Field descriptors.
//!
//! A record layout is a `&'static [FieldDescriptor]` listing its fields in
//! offset order. Descriptors are built with `const fn` constructors so every
//! layout is a compile-time constant:
//!
//! ```
//! use helix_smbios::codec::FieldDescriptor as F;
//!
//! const LAYOUT: &[F] = &[
//!     F::string("Manufacturer"),
//!     F::u16("Speed").default_value(0xffff),
//!     F::u8("Reserved").ignored(),
//!     F::u8("Status").skip(2),
//! ];
//! # assert_eq!(LAYOUT.len(), 4);
//! ```

use super::SubCodec;

/// Encoding of one field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    /// One-byte index into the string section
    Str,
    /// Fixed-size byte array
    Bytes(usize),
    /// Inline sub-record
    Nested { name: &'static str, fields: &'static [FieldDescriptor] },
    /// Variable-length encoding handled by its own codec
    Custom(&'static dyn SubCodec),
}

impl FieldKind {
    /// Encoded width for fixed-size kinds.
    pub const fn width(&self) -> Option<usize> {
        match self {
            Self::U8 | Self::Str => Some(1),
            Self::U16 => Some(2),
            Self::U32 => Some(4),
            Self::U64 => Some(8),
            Self::Bytes(n) => Some(*n),
            Self::Nested { .. } | Self::Custom(_) => None,
        }
    }
}

/// One field of a record layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Field is not backed by any bytes
    pub ignore: bool,
    /// Bytes to step over before the field
    pub skip: usize,
    /// Value used when the structure ends before this field
    pub default: Option<u64>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, ignore: false, skip: 0, default: None }
    }

    pub const fn u8(name: &'static str) -> Self {
        Self::new(name, FieldKind::U8)
    }

    pub const fn u16(name: &'static str) -> Self {
        Self::new(name, FieldKind::U16)
    }

    pub const fn u32(name: &'static str) -> Self {
        Self::new(name, FieldKind::U32)
    }

    pub const fn u64(name: &'static str) -> Self {
        Self::new(name, FieldKind::U64)
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldKind::Str)
    }

    pub const fn bytes(name: &'static str, len: usize) -> Self {
        Self::new(name, FieldKind::Bytes(len))
    }

    pub const fn nested(
        name: &'static str,
        record: &'static str,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self::new(name, FieldKind::Nested { name: record, fields })
    }

    pub const fn custom(name: &'static str, codec: &'static dyn SubCodec) -> Self {
        Self::new(name, FieldKind::Custom(codec))
    }

    pub const fn ignored(self) -> Self {
        Self { ignore: true, ..self }
    }

    pub const fn skip(self, bytes: usize) -> Self {
        Self { skip: bytes, ..self }
    }

    pub const fn default_value(self, value: u64) -> Self {
        Self { default: Some(value), ..self }
    }
}
