//! ACPI table viewer.
//!
//! Reads raw table images (for example from `/sys/firmware/acpi/tables` or
//! `acpidump -b`), traces every field, validates what the decoder knows how
//! to check, and exits non-zero when any table reported an error.

mod cli;
mod config;
mod sink;
mod verbose;

use std::path::Path;
use std::process::ExitCode;

use acpiview::dump::dump_raw;
use acpiview::tables::parse_table;
use acpiview::{Counters, Session, Style};
use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::sink::TerminalSink;
use crate::verbose::{Timer, dprintln, vprintln};

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    let select = cli.select.as_deref().map(parse_signature).transpose()?;
    let config = config::resolve(&cli)?;
    vprintln!("settings: {config:?}");

    let mut sink = TerminalSink::new(std::io::stdout().lock());
    let mut session = Session::new(&mut sink, config);
    let mut totals = Counters::default();

    for path in &cli.files {
        let data = read_table(path)?;
        if let Some(select) = select {
            if data.get(..4) != Some(&select[..]) {
                dprintln!("skipping {}: signature does not match", path.display());
                continue;
            }
        }
        totals.accumulate(decode(&mut session, path, &data, cli.dump));
    }

    print_statistics(&mut session, totals);
    drop(session);
    let _stdout = sink.finish().context("failed to write table output")?;

    Ok(if totals.errors() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn parse_signature(text: &str) -> Result<[u8; 4]> {
    match <[u8; 4]>::try_from(text.as_bytes()) {
        Ok(signature) => Ok(signature),
        Err(_) => bail!("table signature must be exactly 4 bytes, got '{text}'"),
    }
}

fn read_table(path: &Path) -> Result<Vec<u8>> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    vprintln!("loaded {} ({} bytes)", path.display(), data.len());
    Ok(data)
}

/// Decodes one file and returns the errors and warnings it produced.
fn decode(session: &mut Session<'_>, path: &Path, data: &[u8], dump: bool) -> Counters {
    let _t = Timer::start(format!("decode {}", path.display()));
    session.reset_counters();

    if dump {
        dump_raw(session, data);
    }
    let signature = parse_table(session, data);

    let counters = session.counters();
    vprintln!(
        "{}: {} ({} errors, {} warnings)",
        path.display(),
        signature.map_or_else(|| "?".to_string(), |s| s.escape_ascii().to_string()),
        counters.errors(),
        counters.warnings(),
    );
    session.print(format_args!("\n"));
    counters
}

fn print_statistics(session: &mut Session<'_>, counters: Counters) {
    session.print(format_args!("Table Statistics:\n"));

    let errors = format!("\t{} Error(s)\n", counters.errors());
    if counters.errors() > 0 {
        session.print_styled(Style::Error, format_args!("{errors}"));
    } else {
        session.print(format_args!("{errors}"));
    }

    let warnings = format!("\t{} Warning(s)\n", counters.warnings());
    if counters.warnings() > 0 {
        session.print_styled(Style::Warning, format_args!("{warnings}"));
    } else {
        session.print(format_args!("{warnings}"));
    }
}
