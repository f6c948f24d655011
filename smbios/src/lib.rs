//! # Helix SMBIOS - DMI Table Codec
//!
//! Decodes and re-encodes the SMBIOS/DMI tables published by firmware: an
//! entry point (32-bit `_SM_` or 64-bit `_SM3_`) locating a stream of
//! type-tagged structures, each made of a 4-byte header, a formatted region
//! and a trailing string section.
//!
//! ## Layers
//!
//! - [`cursor`]: bounds-checked field reads and writes
//! - [`entry`]: entry point decode, validation and re-encode
//! - [`table`]: splitting a table blob into [`RawStructure`]s and back
//! - [`codec`]: descriptor-driven decode/encode of a structure's formatted region
//! - [`registry`]: dispatch from type code to a typed record
//! - [`records`]: the concrete record catalog (BIOS, System, Chassis, ...)
//!
//! [`SmbiosInfo`] ties the layers together for callers that hold the two
//! firmware buffers (entry point bytes and table bytes).

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod codec;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod filter;
pub mod info;
pub mod records;
pub mod registry;
pub mod table;

pub use cursor::{FieldReader, SmbiosString, TableWriter};
pub use entry::{Entry32, Entry64, EntryPoint, SmbiosVersion};
pub use error::{Error, Result};
pub use filter::TypeFilter;
pub use info::SmbiosInfo;
pub use registry::{DecodeOptions, DecodeReport, Decoded, Diagnostic, Registry, StringPolicy, TypedRecord};
pub use table::{Header, RawStructure, TableType, Tables};

use static_assertions::const_assert;

const_assert!(entry::Entry32::SIZE == 0x1f);
const_assert!(entry::Entry64::SIZE == 0x18);
const_assert!(table::Header::SIZE == 4);
const_assert!(cursor::MAX_STRUCTURE_LEN <= u8::MAX as usize);
const_assert!(info::DUMP_TABLE_OFFSET >= entry::Entry32::SIZE);
