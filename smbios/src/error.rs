//! Error types for SMBIOS decoding and encoding.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::table::TableType;

/// Result type for SMBIOS operations
pub type Result<T> = core::result::Result<T, Error>;

/// SMBIOS error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Entry point framing
    // =========================================================================

    /// Entry point does not start with `_SM_` or `_SM3_`
    InvalidAnchor { found: [u8; 5] },

    /// Declared entry point length differs from the variant's fixed size
    LengthMismatch { expected: u8, found: u8 },

    /// Entry point bytes do not sum to zero
    ChecksumMismatch { expected: u8, found: u8 },

    /// 32-bit entry point is missing its `_DMI_` anchor
    InvalidIntermediateAnchor { found: [u8; 5] },

    /// 32-bit intermediate area does not sum to zero
    IntermediateChecksumMismatch { expected: u8, found: u8 },

    // =========================================================================
    // Truncation
    // =========================================================================

    /// Input ended before `context` was complete
    UnexpectedEndOfData { context: &'static str, offset: usize },

    /// A fixed-width read ran past the formatted region
    OutOfRange { offset: usize, width: usize, len: usize },

    // =========================================================================
    // Structure content
    // =========================================================================

    /// String index outside `1..=count`
    BadStringIndex { index: u8, count: usize },

    /// Decoder was handed a structure of another type
    UnexpectedTableType { expected: TableType, found: TableType },

    /// No decoder is registered for this type code
    UnsupportedType(TableType),

    /// A sub-codec rejected its encoded form
    InvalidSubField { field: &'static str, reason: &'static str },

    /// Caller or descriptor misuse
    InvalidArgument(&'static str),

    /// No structure of this type in the table
    TableNotFound(TableType),

    /// Unrecognised type filter keyword or number
    InvalidTypeFilter(String),

    /// Error raised while handling `record.field`
    Field { record: &'static str, field: &'static str, source: Box<Error> },
}

impl Error {
    /// Wrap an error with the record and field it occurred in.
    pub fn in_field(self, record: &'static str, field: &'static str) -> Self {
        Self::Field { record, field, source: Box::new(self) }
    }

    /// Innermost error, looking through [`Error::Field`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Self::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for errors caused by input that stops short.
    pub fn is_truncation(&self) -> bool {
        matches!(self.root(), Self::UnexpectedEndOfData { .. } | Self::OutOfRange { .. })
    }
}

fn anchor_text(bytes: &[u8; 5]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect()
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAnchor { found } => {
                write!(f, "invalid entry point anchor \"{}\"", anchor_text(found))
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "entry point length is 0x{:02x}, expected 0x{:02x}", found, expected)
            }
            Self::ChecksumMismatch { expected, found } => {
                write!(f, "entry point checksum is 0x{:02x}, expected 0x{:02x}", found, expected)
            }
            Self::InvalidIntermediateAnchor { found } => {
                write!(f, "invalid intermediate anchor \"{}\"", anchor_text(found))
            }
            Self::IntermediateChecksumMismatch { expected, found } => write!(
                f,
                "intermediate checksum is 0x{:02x}, expected 0x{:02x}",
                found, expected
            ),
            Self::UnexpectedEndOfData { context, offset } => {
                write!(f, "unexpected end of data in {} at offset {:#x}", context, offset)
            }
            Self::OutOfRange { offset, width, len } => write!(
                f,
                "{}-byte read at offset {:#x} is out of range (length {:#x})",
                width, offset, len
            ),
            Self::BadStringIndex { index, count } => {
                write!(f, "bad string index {} ({} strings)", index, count)
            }
            Self::UnexpectedTableType { expected, found } => {
                write!(f, "unexpected table type {} (want {})", found.0, expected.0)
            }
            Self::UnsupportedType(t) => write!(f, "unsupported table type {}", t.0),
            Self::InvalidSubField { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::InvalidArgument(reason) => write!(f, "invalid argument: {}", reason),
            Self::TableNotFound(t) => write!(f, "no table of type {} found", t.0),
            Self::InvalidTypeFilter(item) => write!(f, "invalid type: {}", item),
            Self::Field { record, field, source } => {
                write!(f, "failed to parse {}.{}: {}", record, field, source)
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Field { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_wrapping_keeps_root() {
        let err = Error::OutOfRange { offset: 3, width: 2, len: 4 }.in_field("Cache", "speed");
        assert!(err.is_truncation());
        assert_eq!(err.root(), &Error::OutOfRange { offset: 3, width: 2, len: 4 });
        assert_eq!(
            err.to_string(),
            "failed to parse Cache.speed: 2-byte read at offset 0x3 is out of range (length 0x4)"
        );
    }

    #[test]
    fn test_anchor_display_masks_binary() {
        let err = Error::InvalidAnchor { found: *b"_S_M\0" };
        assert_eq!(err.to_string(), "invalid entry point anchor \"_S_M.\"");
        assert!(!err.is_truncation());
    }
}
