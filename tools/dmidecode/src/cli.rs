//! Command-line arguments and exit codes.

use std::fmt;
use std::io;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use helix_smbios::{Error, TypeFilter};
use log::LevelFilter;

/// I/O or decode failure
pub const EXIT_FAILURE: i32 = 1;
/// Bad arguments
pub const EXIT_USAGE: i32 = 2;

const LONG_ABOUT: &str = "Dump a computer's DMI (SMBIOS) table in a human-readable format.

The table describes the system's hardware components along with serial numbers,
firmware revisions and similar inventory data. On Linux the data is read from
/sys/firmware/dmi/tables; --from-dump reads a file written by --dump-bin instead.";

#[derive(Parser, Debug)]
#[command(name = "dmidecode-rs", version, about = "DMI table decoder", long_about = LONG_ABOUT)]
pub struct Cli {
    #[arg(
        long = "dump-bin",
        value_name = "FILE",
        long_help = "Do not decode the entries, instead dump the DMI data to FILE in binary form. \
                     The file is suitable to pass to --from-dump later."
    )]
    pub dump_bin: Option<PathBuf>,
    #[arg(
        long = "from-dump",
        value_name = "FILE",
        long_help = "Read the DMI data from a binary file previously generated using --dump-bin."
    )]
    pub from_dump: Option<PathBuf>,
    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        action = ArgAction::Append,
        long_help = "Only display the entries of type TYPE. TYPE is a DMI type number, a comma \
                     separated list of type numbers, or one of the keywords bios, system, \
                     baseboard, chassis, processor, memory, cache, connector, slot. \
                     Repeating the option displays the union of all given types."
    )]
    pub types: Vec<String>,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        long_help = "Log more to stderr. Repeat for debug and trace output."
    )]
    pub verbose: u8,
}

impl Cli {
    pub fn type_filter(&self) -> Result<TypeFilter, CliError> {
        TypeFilter::parse(&self.types)
            .map_err(|e| CliError::new(EXIT_USAGE, format!("invalid --type: {}", e)))
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// A failure with the process exit code it maps to.
#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Wrap a decode error with what was being done.
    pub fn parse(context: &str, error: &Error) -> Self {
        Self::new(EXIT_FAILURE, format!("{}: {}", context, error))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::new(EXIT_FAILURE, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_types() {
        let cli = Cli::try_parse_from(["dmidecode-rs", "-t", "bios", "--type", "4,17"]).unwrap();
        assert_eq!(cli.types, ["bios", "4,17"]);
        let filter = cli.type_filter().unwrap();
        let codes: Vec<u8> = filter.iter().map(|t| t.0).collect();
        assert_eq!(codes, [0, 4, 13, 17]);
    }

    #[test]
    fn test_invalid_type_is_usage_error() {
        let cli = Cli::try_parse_from(["dmidecode-rs", "-t", "gpu"]).unwrap();
        let err = cli.type_filter().unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert_eq!(err.to_string(), "invalid --type: invalid type: gpu");
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["dmidecode-rs", "-vv"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        let cli = Cli::try_parse_from(["dmidecode-rs"]).unwrap();
        assert_eq!(cli.log_level(), LevelFilter::Warn);
        assert!(cli.dump_bin.is_none());
    }

    #[test]
    fn test_dump_paths() {
        let cli =
            Cli::try_parse_from(["dmidecode-rs", "--from-dump", "in.bin", "--dump-bin", "out.bin"])
                .unwrap();
        assert_eq!(cli.from_dump, Some(PathBuf::from("in.bin")));
        assert_eq!(cli.dump_bin, Some(PathBuf::from("out.bin")));
    }
}
