//! Where the entry point and table bytes come from.

use std::fs;
use std::io;
use std::path::Path;

use helix_smbios::info::split_dump;

use crate::cli::CliError;

/// Entry point bytes and table bytes.
pub type RawTables = (Vec<u8>, Vec<u8>);

/// Read from a dump file when given, otherwise from the firmware.
pub fn load(from_dump: Option<&Path>) -> Result<RawTables, CliError> {
    match from_dump {
        Some(path) => {
            log::info!("reading SMBIOS data from {}", path.display());
            let image = fs::read(path).map_err(|e| {
                CliError::from(io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
            })?;
            let (entry, table) = split_dump(&image)
                .map_err(|e| CliError::parse("error reading dump", &e))?;
            Ok((entry.to_vec(), table.to_vec()))
        }
        None => firmware::load().map_err(|e| {
            CliError::from(io::Error::new(e.kind(), format!("error loading firmware tables: {}", e)))
        }),
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", feature = "sysfs"))] {
        mod firmware {
            use std::fs;
            use std::io;
            use std::path::Path;

            const SYSFS_DMI_DIR: &str = "/sys/firmware/dmi/tables";

            pub fn load() -> io::Result<super::RawTables> {
                let dir = Path::new(SYSFS_DMI_DIR);
                log::info!("reading SMBIOS data from {}", dir.display());
                let entry = fs::read(dir.join("smbios_entry_point"))?;
                let table = fs::read(dir.join("DMI"))?;
                Ok((entry, table))
            }
        }
    } else {
        mod firmware {
            use std::io;

            pub fn load() -> io::Result<super::RawTables> {
                Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "no firmware table source on this platform, use --from-dump",
                ))
            }
        }
    }
}
