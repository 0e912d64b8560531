//! Generic Address Structure rendering.

use crate::field::{Field, Format};
use crate::parser::parse_fields;
use crate::session::Session;

/// Size of a Generic Address Structure in bytes.
pub const GAS_SIZE: usize = 12;

/// Field list describing the Generic Address Structure.
pub const GAS_FIELDS: [Field; 5] = [
    Field::new("Address Space ID", 1, 0).format(Format::Hex),
    Field::new("Register Bit Width", 1, 1).format(Format::Hex),
    Field::new("Register Bit Offset", 1, 2).format(Format::Hex),
    Field::new("Address Size", 1, 3).format(Format::Hex),
    Field::new("Address", 8, 4).format(Format::Hex),
];

/// Traces a Generic Address Structure on the lines following the current
/// one, indented by `indent`.
///
/// Returns the number of bytes consumed.
pub fn dump_gas_struct(session: &mut Session<'_>, data: &[u8], indent: usize) -> usize {
    session.print(format_args!("\n"));
    parse_fields(session, true, indent, None, data, &GAS_FIELDS).consumed()
}

/// Renderer for a 12-byte field holding a Generic Address Structure.
pub fn dump_gas(session: &mut Session<'_>, _format: Option<Format>, data: &[u8]) {
    dump_gas_struct(session, data.get(..GAS_SIZE).unwrap_or(data), 2);
}
