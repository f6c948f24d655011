//! Text report and binary dump output.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use helix_smbios::info::dump_image;
use helix_smbios::{DecodeOptions, EntryPoint, Error, Registry, SmbiosInfo, TypeFilter};

use crate::cli::CliError;

/// Print the entry point summary and every table `filter` accepts.
///
/// Structures the registry cannot decode are printed as hex dumps.
pub fn write_report<W: Write>(
    out: &mut W,
    info: &SmbiosInfo,
    filter: &TypeFilter,
    registry: &Registry,
    options: &DecodeOptions,
) -> io::Result<()> {
    writeln!(out, "{} present.", info.entry)?;
    if let EntryPoint::Bits32(e) = &info.entry {
        writeln!(
            out,
            "{} structures occupying {} bytes.",
            e.number_of_structures, e.structure_table_length
        )?;
    }
    writeln!(out)?;

    for table in info.tables.iter().filter(|t| filter.accepts(t.table_type())) {
        match registry.decode_typed(table, options.string_policy) {
            Ok(record) => write!(out, "{}\n\n", record)?,
            Err(e) => {
                if !matches!(e, Error::UnsupportedType(_)) {
                    log::error!("{}", e);
                }
                write!(out, "{}\n\n", table)?;
            }
        }
    }
    Ok(())
}

/// Write a dump image of the data to `path`.
pub fn dump_bin<W: Write>(
    out: &mut W,
    entry: &[u8],
    table: &[u8],
    path: &Path,
) -> Result<(), CliError> {
    let image = dump_image(entry, table).map_err(|e| CliError::parse("error building dump", &e))?;
    let entry_len = image.len() - table.len();
    writeln!(out, "# Writing {} bytes to {}.", entry_len, path.display())?;
    writeln!(out, "# Writing {} bytes to {}.", table.len(), path.display())?;
    fs::write(path, &image)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use helix_smbios::info::{split_dump, DUMP_TABLE_OFFSET};

    const ENTRY32: [u8; 31] = [
        0x5f, 0x53, 0x4d, 0x5f, 0x64, 0x1f, 0x02, 0x08, 0x14, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x5f, 0x44, 0x4d, 0x49, 0x5f, 0x37, 0x6e, 0x08, 0x00, 0x50, 0x7c, 0xac, 0x1b, 0x00,
        0x28,
    ];

    const TABLES: &[u8] = &[
        0x03, 0x09, 0x01, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00, // chassis
        0xc8, 0x06, 0x02, 0x00, 0xaa, 0xbb, 0x00, 0x00, // OEM
        0x7f, 0x04, 0x03, 0x00, 0x00, 0x00,
    ];

    fn render(types: &[&str]) -> String {
        let info = SmbiosInfo::parse(&ENTRY32, TABLES).unwrap();
        let filter = TypeFilter::parse(types).unwrap();
        let mut out = Vec::new();
        write_report(&mut out, &info, &filter, Registry::shared(), &DecodeOptions::default())
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_report_header() {
        let text = render(&["chassis"]);
        assert!(text.starts_with("SMBIOS 2.8 present.\n27 structures occupying 2158 bytes.\n\n"));
        assert!(text.contains("Handle 0x0001, DMI type 3, 9 bytes"));
        assert!(text.contains("Notebook"));
        assert!(!text.contains("DMI type 127"));
    }

    #[test]
    fn test_unsupported_falls_back_to_raw() {
        let text = render(&["200"]);
        assert!(text.contains("Handle 0x0002, DMI type 200, 6 bytes"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_empty_filter_prints_everything() {
        let text = render(&[]);
        assert_eq!(text.matches("Handle 0x").count(), 3);
    }

    #[test]
    fn test_dump_bin() {
        let path =
            std::env::temp_dir().join(format!("dmidecode-rs-dump-{}.bin", std::process::id()));
        let mut out = Vec::new();
        dump_bin(&mut out, &ENTRY32, TABLES, &path).unwrap();
        let image = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();

        let text = String::from_utf8(out).unwrap();
        let expected = format!(
            "# Writing {} bytes to {}.\n# Writing {} bytes to {}.\n",
            DUMP_TABLE_OFFSET,
            path.display(),
            TABLES.len(),
            path.display()
        );
        assert_eq!(text, expected);
        let (_, table) = split_dump(&image).unwrap();
        assert_eq!(table, TABLES);
    }
}
