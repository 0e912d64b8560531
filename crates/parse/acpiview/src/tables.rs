//! Table-level entry point: header checks and dispatch by signature.

use crate::dump::verify_checksum;
use crate::header::{dump_header, parse_header, HEADER_SIZE};
use crate::madt::{parse_madt, MADT_SIGNATURE};
use crate::pptt::{parse_pptt, PPTT_SIGNATURE};
use crate::session::Session;

/// Decoder for one table family.
///
/// Receives the table clamped to its declared length and the table revision.
pub type TableParser = fn(&mut Session<'_>, &[u8], u8);

/// A table signature and the decoder registered for it.
#[derive(Debug, Clone, Copy)]
pub struct TableEntry {
    /// 4-byte ASCII signature.
    pub signature: &'static [u8; 4],
    /// Decoder for tables carrying this signature.
    pub parser: TableParser,
}

/// Every table with a dedicated decoder.
pub static TABLE_PARSERS: [TableEntry; 2] = [
    TableEntry {
        signature: MADT_SIGNATURE,
        parser: parse_madt,
    },
    TableEntry {
        signature: PPTT_SIGNATURE,
        parser: parse_pptt,
    },
];

/// Looks up the decoder registered for `signature`.
#[must_use]
pub fn find_parser(signature: &[u8; 4]) -> Option<TableParser> {
    TABLE_PARSERS
        .iter()
        .find(|entry| entry.signature == signature)
        .map(|entry| entry.parser)
}

/// Decodes one complete ACPI table held in `data`.
///
/// The header is read first to learn the declared length. A table whose
/// declared length runs past `data` is reported and decoded up to the end
/// of the buffer; bytes beyond the declared length are ignored. Returns the
/// table signature, or `None` if `data` cannot hold a header.
pub fn parse_table(session: &mut Session<'_>, data: &[u8]) -> Option<[u8; 4]> {
    if data.len() < HEADER_SIZE {
        session.error(format_args!(
            "Buffer too short to hold an ACPI table header. Length = {}.",
            data.len()
        ));
        return None;
    }

    let (_, info) = parse_header(session, data);
    let (Some(&signature), Some(length), Some(revision)) =
        (info.signature, info.length, info.revision)
    else {
        return None;
    };

    let declared = usize::try_from(length).unwrap_or(usize::MAX);
    if declared < HEADER_SIZE {
        session.error(format_args!(
            "Invalid table length. Length = {declared}. Minimum = {HEADER_SIZE}."
        ));
        return Some(signature);
    }

    let table = match data.get(..declared) {
        Some(table) => table,
        None => {
            session.error(format_args!(
                "Table length exceeds the buffer. Length = {declared}. BufferLength = {}.",
                data.len()
            ));
            data
        }
    };

    verify_checksum(session, true, table);

    match find_parser(&signature) {
        Some(parser) => parser(session, table, revision),
        None => {
            dump_header(session, table);
            session.print(format_args!(
                "\nParser not implemented for {} table.\n",
                signature.escape_ascii()
            ));
        }
    }

    Some(signature)
}
