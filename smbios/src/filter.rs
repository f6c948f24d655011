//! Structure type selection.

use alloc::collections::BTreeSet;
use alloc::string::ToString;

use crate::error::{Error, Result};
use crate::table::TableType;

/// Named groups of type codes, as accepted by dmidecode.
pub const TYPE_GROUPS: &[(&str, &[u8])] = &[
    ("bios", &[0, 13]),
    ("system", &[1, 12, 15, 23, 32]),
    ("baseboard", &[2, 10, 41]),
    ("chassis", &[3]),
    ("processor", &[4]),
    ("memory", &[5, 6, 16, 17]),
    ("cache", &[7]),
    ("connector", &[8]),
    ("slot", &[9]),
];

/// Set of accepted type codes; empty accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFilter {
    types: BTreeSet<TableType>,
}

impl TypeFilter {
    /// Parse filter arguments.
    ///
    /// Each item may hold several comma separated entries; an entry is a
    /// group keyword or a type number (decimal or `0x` hex).
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut filter = Self::default();
        for entry in items.iter().flat_map(|s| s.as_ref().split(',')) {
            filter.add(entry.trim())?;
        }
        Ok(filter)
    }

    fn add(&mut self, entry: &str) -> Result<()> {
        let lower = entry.to_ascii_lowercase();
        if let Some((_, codes)) = TYPE_GROUPS.iter().find(|(name, _)| *name == lower) {
            self.types.extend(codes.iter().copied().map(TableType));
            return Ok(());
        }
        let parsed = match lower.strip_prefix("0x") {
            Some(hex) => u8::from_str_radix(hex, 16),
            None => lower.parse::<u8>(),
        };
        let code = parsed.map_err(|_| Error::InvalidTypeFilter(entry.to_string()))?;
        self.types.insert(TableType(code));
        Ok(())
    }

    pub fn insert(&mut self, table_type: TableType) {
        self.types.insert(table_type);
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn accepts(&self, table_type: TableType) -> bool {
        self.types.is_empty() || self.types.contains(&table_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = TableType> + '_ {
        self.types.iter().copied()
    }
}
