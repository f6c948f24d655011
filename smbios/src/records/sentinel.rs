//! Inactive (Type 126) and End-of-Table (Type 127) markers.
//!
//! Neither carries fields; both keep the structure they came from so the
//! header can be reported and re-encoded.

use alloc::vec::Vec;
use core::fmt;

use crate::codec::{FieldDescriptor, FieldValue, Fields, Record};
use crate::error::Result;
use crate::table::{RawStructure, TableType};

macro_rules! sentinel_record {
    ($(#[$doc:meta])* $name:ident, $table_type:expr, $label:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct $name {
            pub table: RawStructure,
        }

        impl Record for $name {
            const TABLE_TYPE: TableType = $table_type;
            const NAME: &'static str = $label;
            const MIN_LEN: usize = 0;
            const FIELDS: &'static [FieldDescriptor] = &[];

            fn from_fields(table: &RawStructure, _: &mut Fields) -> Result<Self> {
                Ok(Self { table: table.clone() })
            }

            fn to_fields(&self) -> Vec<FieldValue> {
                Vec::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.table.header())
            }
        }
    };
}

sentinel_record!(
    /// Structure disabled by firmware but left in the table.
    Inactive,
    TableType::INACTIVE,
    "Inactive"
);

sentinel_record!(
    /// Last structure of the table.
    EndOfTable,
    TableType::END_OF_TABLE,
    "EndOfTable"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringPolicy;
    use crate::error::Error;
    use crate::table::Tables;

    #[test]
    fn test_end_of_table() {
        let tables = Tables::parse(&[0x7f, 0x04, 0xfe, 0xff, 0x00, 0x00]).unwrap();
        let raw = tables.first_of_type(TableType::END_OF_TABLE).unwrap();
        let eot = EndOfTable::parse(raw, StringPolicy::Strict).unwrap();
        assert_eq!(eot.to_string(), "Handle 0xFFFE, DMI type 127, 4 bytes\nEnd Of Table");
        assert_eq!(eot.encode(0xfffe).unwrap(), *raw);
    }

    #[test]
    fn test_inactive_rejects_other_types() {
        let tables = Tables::parse(&[0x7f, 0x04, 0xfe, 0xff, 0x00, 0x00]).unwrap();
        let raw = tables.iter().next().unwrap();
        assert_eq!(
            Inactive::parse(raw, StringPolicy::Strict),
            Err(Error::UnexpectedTableType {
                expected: TableType::INACTIVE,
                found: TableType::END_OF_TABLE,
            })
        );
    }
}
