//! Field-list interpreter.
//!
//! [`parse_fields`] walks a descriptor list over a byte buffer, checking that
//! declared offsets match the running offset and that no field is read past
//! the end of the buffer, and renders each field when tracing.

use alloc::vec;
use alloc::vec::Vec;

use crate::bytes::FromBytes;
use crate::field::{print_uint, Field, FieldView, Render};
use crate::session::{Session, OUTPUT_FIELD_COLUMN_WIDTH};
use crate::sink::Style;

/// Result of running a descriptor list over a buffer.
#[derive(Debug, Clone)]
pub struct Parsed<'a> {
    consumed: usize,
    captures: Vec<Option<FieldView<'a>>>,
}

impl<'a> Parsed<'a> {
    /// Number of bytes consumed: the summed length of every field that fit.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns the captured view of the descriptor at `index`.
    ///
    /// `None` if the descriptor does not capture or lay beyond the buffer.
    #[must_use]
    pub fn capture(&self, index: usize) -> Option<FieldView<'a>> {
        self.captures.get(index).copied().flatten()
    }

    /// Reads the captured descriptor at `index` as a little-endian value.
    #[must_use]
    pub fn read<T: FromBytes>(&self, index: usize) -> Option<T> {
        self.capture(index)?.read()
    }
}

/// Runs the descriptor list `fields` over `data`.
///
/// When `trace` is set, `name` (if given) is printed as a section header and
/// every labelled field is rendered. `indent` is added to the session indent
/// for the duration of the call.
///
/// Fields are addressed sequentially; declared offsets are only compared
/// against the running offset, and a mismatch is reported without changing
/// where decoding continues. A field that does not fit in the rest of `data`
/// is skipped and left uncaptured without advancing the offset, so a later,
/// smaller field may still be decoded at the running offset.
pub fn parse_fields<'a>(
    session: &mut Session<'_>,
    trace: bool,
    indent: usize,
    name: Option<&str>,
    data: &'a [u8],
    fields: &[Field],
) -> Parsed<'a> {
    session.indented(indent, |session| {
        if trace {
            if let Some(name) = name {
                print_section(session, name);
            }
        }

        let mut captures = vec![None; fields.len()];
        let mut offset = 0usize;

        for (index, field) in fields.iter().enumerate() {
            let Some(bytes) = offset
                .checked_add(field.length())
                .and_then(|end| data.get(offset..end))
            else {
                continue;
            };

            if session.consistency_checking() && offset != field.offset() {
                session.print(format_args!("\n"));
                session.error(format_args!(
                    "{}: Offset Mismatch for {}\nCurrentOffset = {} FieldOffset = {}",
                    name.unwrap_or(""),
                    field.name().unwrap_or(""),
                    offset,
                    field.offset(),
                ));
            }

            if trace {
                if let Some(label) = field.name() {
                    trace_field(session, name, label, field, bytes);
                }
            }

            if field.captures() {
                captures[index] = Some(FieldView::new(offset, bytes));
            }

            offset += field.length();
        }

        Parsed {
            consumed: offset,
            captures,
        }
    })
}

fn print_section(session: &mut Session<'_>, name: &str) {
    let pad = session.indent();
    let width = OUTPUT_FIELD_COLUMN_WIDTH.saturating_sub(pad);
    session.print_styled(Style::Section, format_args!("{:pad$}{name:<width$} :\n", ""));
}

fn trace_field(
    session: &mut Session<'_>,
    table: Option<&str>,
    label: &str,
    field: &Field,
    bytes: &[u8],
) {
    session.print_field_name(2, label);

    let rendered = match field.render() {
        Render::Label => true,
        Render::Format(format) => print_uint(session, format, bytes),
        Render::Custom { renderer, format } => {
            renderer(session, format, bytes);
            true
        }
    };
    session.print(format_args!("\n"));

    if !rendered {
        session.error(format_args!(
            "{}: CANNOT PARSE THIS FIELD, Field Length = {}",
            table.unwrap_or(""),
            field.length(),
        ));
    }

    if session.consistency_checking() {
        if let Some(validator) = field.validator() {
            validator(session, bytes, field.context());
        }
    }
}
