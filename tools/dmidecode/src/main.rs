//! dmidecode-rs: print or dump the firmware's SMBIOS tables.

mod cli;
mod logger;
mod report;
mod source;

use std::io::{self, Write};
use std::process;

use clap::Parser;
use helix_smbios::{DecodeOptions, Registry, SmbiosInfo};

use crate::cli::{Cli, CliError};

fn main() {
    let cli = Cli::parse();
    logger::init(cli.log_level());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run(&cli, &mut out);
    if let Err(e) = flush_after(&mut out, result) {
        eprintln!("{}", e);
        process::exit(e.code);
    }
}

fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), CliError> {
    let filter = cli.type_filter()?;
    writeln!(out, "# dmidecode-rs")?;

    let (entry, table) = source::load(cli.from_dump.as_deref())?;
    if let Some(path) = &cli.dump_bin {
        return report::dump_bin(out, &entry, &table, path);
    }

    let info = SmbiosInfo::parse(&entry, &table)
        .map_err(|e| CliError::parse("error parsing SMBIOS data", &e))?;
    report::write_report(out, &info, &filter, Registry::shared(), &DecodeOptions::default())?;
    Ok(())
}

/// Flush `out`, keeping the first error.
fn flush_after<W: Write>(out: &mut W, result: Result<(), CliError>) -> Result<(), CliError> {
    let flushed = out.flush().map_err(CliError::from);
    result.and(flushed)
}
