//! Record catalog.
//!
//! Each record pairs a field layout with a typed struct. The layouts are
//! plain data for the generic codec; the structs add derived values and
//! dmidecode-style report text.

use core::fmt;

use crate::codec::Record;
use crate::error::Result;
use crate::table::RawStructure;

pub mod baseboard;
pub mod bios;
pub mod cache;
pub mod chassis;
pub mod ipmi;
pub mod memory;
pub mod processor;
pub mod sentinel;
pub mod slots;
pub mod system;
pub mod tpm;

pub use baseboard::BaseboardInfo;
pub use bios::BiosInfo;
pub use cache::CacheInfo;
pub use chassis::ChassisInfo;
pub use ipmi::IpmiDeviceInfo;
pub use memory::MemoryDevice;
pub use processor::ProcessorInfo;
pub use sentinel::{EndOfTable, Inactive};
pub use slots::SystemSlots;
pub use system::SystemInfo;
pub use tpm::TpmDevice;

/// Build a raw structure from a typed record.
pub fn encode<R: Record>(record: &R, handle: u16) -> Result<RawStructure> {
    record.encode(handle)
}

/// Marker printed for values outside the defined range.
pub(crate) const OUT_OF_SPEC: &str = "<OUT OF SPEC>";

/// Byte count in the largest exact binary unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(u64, &str); 4] =
            [(1 << 40, "TB"), (1 << 30, "GB"), (1 << 20, "MB"), (1 << 10, "kB")];
        let v = self.0;
        for (scale, unit) in UNITS {
            if v >= scale && v % scale == 0 {
                return write!(f, "{} {}", v / scale, unit);
            }
        }
        write!(f, "{} bytes", v)
    }
}

/// Write one `\t\t<description>` line per set flag, in table order.
pub(crate) fn write_flag_lines<F: bitflags::Flags + Copy>(
    f: &mut fmt::Formatter<'_>,
    value: F,
    names: &[(F, &str)],
) -> fmt::Result {
    for (flag, name) in names {
        if value.contains(*flag) {
            write!(f, "\n\t\t{}", name)?;
        }
    }
    Ok(())
}

/// Name from a code table, or the raw value in hex.
pub(crate) struct Lookup<'a> {
    pub value: u8,
    pub names: &'a [(u8, &'a str)],
}

impl fmt::Display for Lookup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.names.iter().find(|(code, _)| *code == self.value) {
            Some((_, name)) => f.write_str(name),
            None => write!(f, "{:#x}", self.value),
        }
    }
}

/// Name from a 1-based dense list, or [`OUT_OF_SPEC`].
pub(crate) fn dense_name(value: u8, names: &[&'static str]) -> &'static str {
    usize::from(value)
        .checked_sub(1)
        .and_then(|i| names.get(i).copied())
        .unwrap_or(OUT_OF_SPEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size_units() {
        assert_eq!(ByteSize(0x100_0000).to_string(), "16 MB");
        assert_eq!(ByteSize(64 * 1024).to_string(), "64 kB");
        assert_eq!(ByteSize(3 << 30).to_string(), "3 GB");
        assert_eq!(ByteSize(1 << 40).to_string(), "1 TB");
        assert_eq!(ByteSize(1000).to_string(), "1000 bytes");
    }

    #[test]
    fn test_dense_name() {
        const NAMES: &[&str] = &["Other", "Unknown"];
        assert_eq!(dense_name(1, NAMES), "Other");
        assert_eq!(dense_name(0, NAMES), OUT_OF_SPEC);
        assert_eq!(dense_name(3, NAMES), OUT_OF_SPEC);
    }
}
