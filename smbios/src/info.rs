//! Entry point and table stream together.

use alloc::vec::Vec;
use core::fmt;

use crate::codec::{Record, StringPolicy};
use crate::entry::EntryPoint;
use crate::error::{Error, Result};
use crate::records::{
    BaseboardInfo, BiosInfo, CacheInfo, ChassisInfo, IpmiDeviceInfo, MemoryDevice, ProcessorInfo,
    SystemInfo, SystemSlots, TpmDevice,
};
use crate::registry::{DecodeOptions, DecodeReport, Registry};
use crate::table::Tables;

/// Offset of the table in a dump image.
pub const DUMP_TABLE_OFFSET: usize = 0x20;

/// A parsed SMBIOS snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmbiosInfo {
    pub entry: EntryPoint,
    pub tables: Tables,
}

impl SmbiosInfo {
    /// Parse the entry point and the table region it describes.
    pub fn parse(entry_bytes: &[u8], table_bytes: &[u8]) -> Result<Self> {
        let entry = EntryPoint::parse(entry_bytes).map_err(|e| {
            log::error!("error parsing entry point structure: {}", e);
            e
        })?;
        let tables = Tables::parse(table_bytes)?;
        log::debug!("{}: {} structures", entry, tables.len());
        Ok(Self { entry, tables })
    }

    fn first<R: Record>(&self) -> Result<R> {
        let table = self
            .tables
            .first_of_type(R::TABLE_TYPE)
            .ok_or(Error::TableNotFound(R::TABLE_TYPE))?;
        R::parse(table, StringPolicy::default())
    }

    fn all<R: Record>(&self) -> Result<Vec<R>> {
        self.tables
            .by_type(R::TABLE_TYPE)
            .map(|t| R::parse(t, StringPolicy::default()))
            .collect()
    }

    /// The BIOS structure; there is only one.
    pub fn bios_info(&self) -> Result<BiosInfo> {
        self.first()
    }

    /// The system structure; there is only one.
    pub fn system_info(&self) -> Result<SystemInfo> {
        self.first()
    }

    pub fn baseboards(&self) -> Result<Vec<BaseboardInfo>> {
        self.all()
    }

    pub fn chassis(&self) -> Result<Vec<ChassisInfo>> {
        self.all()
    }

    pub fn processors(&self) -> Result<Vec<ProcessorInfo>> {
        self.all()
    }

    pub fn caches(&self) -> Result<Vec<CacheInfo>> {
        self.all()
    }

    pub fn system_slots(&self) -> Result<Vec<SystemSlots>> {
        self.all()
    }

    pub fn memory_devices(&self) -> Result<Vec<MemoryDevice>> {
        self.all()
    }

    pub fn ipmi_devices(&self) -> Result<Vec<IpmiDeviceInfo>> {
        self.all()
    }

    pub fn tpm_devices(&self) -> Result<Vec<TpmDevice>> {
        self.all()
    }

    /// Decode every structure through `registry`.
    pub fn decode(&self, registry: &Registry, options: &DecodeOptions) -> DecodeReport {
        registry.decode_all(&self.tables, options)
    }
}

impl fmt::Display for SmbiosInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} tables)", self.entry, self.tables.len())
    }
}

// =============================================================================
// DUMP IMAGES
// =============================================================================

/// Build a self-contained dump: the entry point pointing at
/// [`DUMP_TABLE_OFFSET`], zero padding, then the table bytes.
pub fn dump_image(entry_bytes: &[u8], table_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut entry = EntryPoint::parse(entry_bytes)?;
    entry.set_table_address(DUMP_TABLE_OFFSET as u64)?;

    let mut image = entry.to_bytes();
    image.resize(DUMP_TABLE_OFFSET, 0);
    image.extend_from_slice(table_bytes);
    Ok(image)
}

/// Split a dump image into entry point bytes and table bytes.
///
/// The table is read at the entry's address for its declared size, clamped
/// to the end of the image.
pub fn split_dump(image: &[u8]) -> Result<(&[u8], &[u8])> {
    let entry = EntryPoint::parse(image)?;
    let (address, size) = entry.table();
    let start = usize::try_from(address)
        .ok()
        .filter(|&a| a <= image.len())
        .ok_or(Error::UnexpectedEndOfData { context: "dump table", offset: image.len() })?;
    let end = start.saturating_add(size).min(image.len());
    if end - start < size {
        log::warn!("dump holds {} table bytes, entry declares {}", end - start, size);
    }
    Ok((&image[..entry.size()], &image[start..end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry32;
    use crate::registry::Decoded;
    use crate::table::TableType;
    use alloc::string::ToString;

    const ENTRY32: [u8; 31] = [
        0x5f, 0x53, 0x4d, 0x5f, 0x64, 0x1f, 0x02, 0x08, 0x14, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x5f, 0x44, 0x4d, 0x49, 0x5f, 0x37, 0x6e, 0x08, 0x00, 0x50, 0x7c, 0xac, 0x1b, 0x00,
        0x28,
    ];

    const TABLES: &[u8] = &[
        0x00, 0x12, 0x00, 0x00, 0x01, 0x00, 0x00, 0xf0, 0x00, 0x03, // BIOS
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        b'A', b'M', b'I', 0x00, 0x00,
        0x03, 0x09, 0x01, 0x00, 0x00, 0x17, 0x00, 0x00, 0x00, 0x00, 0x00, // chassis
        0x03, 0x09, 0x02, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, // chassis
        0x7f, 0x04, 0x03, 0x00, 0x00, 0x00,
    ];

    fn info() -> SmbiosInfo {
        SmbiosInfo::parse(&ENTRY32, TABLES).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let si = info();
        assert_eq!(si.to_string(), "SMBIOS 2.8 (4 tables)");
        assert_eq!(si.bios_info().unwrap().vendor.as_str(), Some("AMI"));
        assert_eq!(si.bios_info().unwrap().rom_size_bytes(), 4 * 65536);
    }

    #[test]
    fn test_getters() {
        let si = info();
        let chassis = si.chassis().unwrap();
        assert_eq!(chassis.len(), 2);
        assert_eq!(chassis[1].type_name(), "Notebook");
        assert!(si.processors().unwrap().is_empty());
        assert_eq!(si.system_info(), Err(Error::TableNotFound(TableType::SYSTEM_INFORMATION)));
    }

    #[test]
    fn test_decode_with_registry() {
        let report = info().decode(Registry::shared(), &DecodeOptions::default());
        assert_eq!(report.entries.len(), 4);
        assert!(report.entries.iter().all(|e| matches!(e, Decoded::Typed(_))));
    }

    #[test]
    fn test_bad_entry() {
        let mut entry = ENTRY32;
        entry[0] = b'x';
        assert!(matches!(SmbiosInfo::parse(&entry, TABLES), Err(Error::InvalidAnchor { .. })));
    }

    #[test]
    fn test_dump_round_trip() {
        let image = dump_image(&ENTRY32, TABLES).unwrap();
        assert_eq!(image.len(), DUMP_TABLE_OFFSET + TABLES.len());
        assert!(image[Entry32::SIZE..DUMP_TABLE_OFFSET].iter().all(|&b| b == 0));

        let EntryPoint::Bits32(e) = EntryPoint::parse(&image).unwrap() else {
            panic!("expected 32-bit entry");
        };
        assert_eq!(e.structure_table_address, 0x20);

        // declared length 0x086e is larger than the table, so it is clamped
        let (entry, table) = split_dump(&image).unwrap();
        assert_eq!(entry.len(), Entry32::SIZE);
        assert_eq!(table, TABLES);
        assert_eq!(SmbiosInfo::parse(entry, table).unwrap().tables.len(), 4);
    }

    #[test]
    fn test_split_dump_bad_address() {
        let mut entry = EntryPoint::parse(&ENTRY32).unwrap();
        entry.set_table_address(0x1000).unwrap();
        let image = entry.to_bytes();
        assert!(split_dump(&image).unwrap_err().is_truncation());
    }
}
