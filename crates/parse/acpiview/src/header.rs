//! Standard ACPI System Description Table header.

use crate::field::{dump_chars, Field, Format};
use crate::parser::parse_fields;
use crate::session::Session;

/// The size of an SDT header in bytes.
pub const HEADER_SIZE: usize = 36;

const SIGNATURE: usize = 0;
const LENGTH: usize = 1;
const REVISION: usize = 2;

/// Field list describing the 36-byte header present at the start of every
/// ACPI table.
pub const HEADER_FIELDS: [Field; 9] = [
    Field::new("Signature", 4, 0).renderer(dump_chars::<4>).capture(),
    Field::new("Length", 4, 4).format(Format::Decimal).capture(),
    Field::new("Revision", 1, 8).format(Format::Decimal).capture(),
    Field::new("Checksum", 1, 9).format(Format::HexUpper),
    Field::new("Oem ID", 6, 10).renderer(dump_chars::<6>),
    Field::new("Oem Table ID", 8, 16).renderer(dump_chars::<8>),
    Field::new("Oem Revision", 4, 24).format(Format::HexUpper),
    Field::new("Creator ID", 4, 28).renderer(dump_chars::<4>),
    Field::new("Creator Revision", 4, 32).format(Format::HexUpper),
];

/// Prepends [`HEADER_FIELDS`] to a table's own fields.
///
/// `M` must equal `HEADER_FIELDS.len() + N`.
///
/// # Panics
///
/// Panics (at compile time when used in a `const`) if `M` is wrong.
#[must_use]
pub const fn with_header<const N: usize, const M: usize>(tail: [Field; N]) -> [Field; M] {
    assert!(M == HEADER_FIELDS.len() + N, "wrong combined field count");
    let mut out = [HEADER_FIELDS[0]; M];
    let mut i = 0;
    while i < HEADER_FIELDS.len() {
        out[i] = HEADER_FIELDS[i];
        i += 1;
    }
    let mut j = 0;
    while j < N {
        out[i + j] = tail[j];
        j += 1;
    }
    out
}

/// Signature, length and revision of a table, borrowed from its buffer.
///
/// A member is `None` when the buffer ended before that field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo<'a> {
    /// 4-byte ASCII table signature.
    pub signature: Option<&'a [u8; 4]>,
    /// Declared total table length, header included.
    pub length: Option<u32>,
    /// Table revision.
    pub revision: Option<u8>,
}

impl<'a> HeaderInfo<'a> {
    /// Extracts the header members from the result of running a field list
    /// that starts with [`HEADER_FIELDS`].
    #[must_use]
    pub fn from_parsed(parsed: &crate::parser::Parsed<'a>) -> Self {
        Self {
            signature: parsed
                .capture(SIGNATURE)
                .and_then(|view| view.bytes().try_into().ok()),
            length: parsed.read(LENGTH),
            revision: parsed.read(REVISION),
        }
    }
}

/// Traces the table header under the label `ACPI Table Header`.
///
/// Returns the number of bytes consumed and the decoded header members.
pub fn dump_header<'a>(session: &mut Session<'_>, data: &'a [u8]) -> (usize, HeaderInfo<'a>) {
    let data = data.get(..HEADER_SIZE).unwrap_or(data);
    let parsed = parse_fields(session, true, 0, Some("ACPI Table Header"), data, &HEADER_FIELDS);
    (parsed.consumed(), HeaderInfo::from_parsed(&parsed))
}

/// Decodes the table header without printing it.
///
/// Returns the number of bytes consumed and the decoded header members.
pub fn parse_header<'a>(session: &mut Session<'_>, data: &'a [u8]) -> (usize, HeaderInfo<'a>) {
    let data = data.get(..HEADER_SIZE).unwrap_or(data);
    let parsed = parse_fields(session, false, 0, None, data, &HEADER_FIELDS);
    (parsed.consumed(), HeaderInfo::from_parsed(&parsed))
}
