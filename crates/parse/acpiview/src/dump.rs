//! Checksum verification and raw hex dumps.

use alloc::string::String;

use crate::session::Session;
use crate::sink::Style;

/// Returns the wrapping byte sum of `data`.
#[must_use]
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Validate the checksum of a table.
///
/// ACPI tables are designed so that the sum of all bytes in the table equals
/// zero (mod 256). When `log` is set the outcome is printed, and a failure is
/// recorded as an error.
pub fn verify_checksum(session: &mut Session<'_>, log: bool, data: &[u8]) -> bool {
    let sum = checksum(data);
    if log {
        if sum == 0 {
            session.print_styled(Style::Success, format_args!("Table Checksum : OK\n\n"));
        } else {
            session.counters_mut().increment_error();
            session.print_styled(
                Style::Error,
                format_args!("Table Checksum : FAILED (0x{sum:X})\n\n"),
            );
        }
    }
    sum == 0
}

/// Prints `data` as a hex dump, sixteen bytes per line followed by their
/// printable ASCII characters.
pub fn dump_raw(session: &mut Session<'_>, data: &[u8]) {
    session.print(format_args!("Length   : {}\n", data.len()));

    let mut ascii = String::with_capacity(16);
    for (count, &byte) in data.iter().enumerate() {
        if count % 16 == 0 {
            session.print(format_args!("  {ascii}\n{count:08X} : "));
            ascii.clear();
        } else if count % 8 == 0 {
            session.print(format_args!("- "));
        }

        ascii.push(if (b' '..0x7F).contains(&byte) {
            char::from(byte)
        } else {
            '.'
        });
        session.print(format_args!("{byte:02X} "));
    }

    // Justify the last line so its ASCII column lines up.
    let partial = data.len() % 16;
    if partial != 0 {
        let mut pad = 48 - partial * 3;
        if partial <= 8 {
            pad += 2;
        }
        session.print(format_args!("{:pad$}", ""));
    }

    session.print(format_args!("  {ascii}\n\n"));
}
