//! Typed sub-record dispatch.
//!
//! A [`StructDatabase`] maps the type code of a self-length-prefixed
//! structure to the way it is decoded, counts how many instances of each
//! type a table contained, and checks those counts against the target
//! architecture once the table has been walked.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::config::ArchCompat;
use crate::field::Field;
use crate::parser::parse_fields;
use crate::session::{Session, INSTANCE_COUNT_INDENT, OUTPUT_FIELD_COLUMN_WIDTH};
use crate::SchemaError;

/// Optional caller-supplied arguments forwarded to a structure function.
pub type StructArgs<'a> = [Option<&'a dyn Any>; 2];

/// Details handed to a custom structure decode function.
pub struct StructCall<'a> {
    /// Display name of the structure type.
    pub name: &'static str,
    /// Instance index of this structure (its type's count before this call).
    pub index: u32,
    /// Indent requested by the caller.
    pub indent: usize,
    /// Optional caller-supplied arguments.
    pub args: StructArgs<'a>,
}

/// Custom decode function for a structure type.
///
/// Must print its own `<Name> [<Index>]` label if it wants one.
pub type StructFn = fn(&mut Session<'_>, &StructCall<'_>, &[u8]);

/// How instances of a structure type are decoded.
#[derive(Clone, Copy)]
pub enum StructParser {
    /// A field list traced under an indexed label.
    Fields(&'static [Field]),
    /// A custom decode function.
    Func(StructFn),
    /// The type is known but decoding it is not supported.
    NotImplemented,
}

impl fmt::Debug for StructParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(&fields.len()).finish(),
            Self::Func(_) => f.write_str("Func"),
            Self::NotImplemented => f.write_str("NotImplemented"),
        }
    }
}

/// Static description of one structure type.
#[derive(Debug, Clone, Copy)]
pub struct StructInfo {
    name: &'static str,
    type_code: u32,
    compat: ArchCompat,
    parser: StructParser,
}

impl StructInfo {
    /// A structure type decoded by a field list.
    #[must_use]
    pub const fn fields(
        name: &'static str,
        type_code: u32,
        compat: ArchCompat,
        fields: &'static [Field],
    ) -> Self {
        Self {
            name,
            type_code,
            compat,
            parser: StructParser::Fields(fields),
        }
    }

    /// A structure type decoded by a custom function.
    #[must_use]
    pub const fn func(name: &'static str, type_code: u32, compat: ArchCompat, func: StructFn) -> Self {
        Self {
            name,
            type_code,
            compat,
            parser: StructParser::Func(func),
        }
    }

    /// A structure type that is recognised but not decoded.
    #[must_use]
    pub const fn not_implemented(name: &'static str, type_code: u32, compat: ArchCompat) -> Self {
        Self {
            name,
            type_code,
            compat,
            parser: StructParser::NotImplemented,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Type code; equal to the entry's index in its database.
    #[must_use]
    pub const fn type_code(&self) -> u32 {
        self.type_code
    }

    /// Architectures this structure may appear on.
    #[must_use]
    pub const fn compat(&self) -> ArchCompat {
        self.compat
    }

    /// Decode strategy.
    #[must_use]
    pub const fn parser(&self) -> StructParser {
        self.parser
    }
}

/// Structure types of one table family together with their instance counts.
#[derive(Debug, Clone)]
pub struct StructDatabase {
    name: &'static str,
    entries: &'static [StructInfo],
    counts: Vec<u32>,
}

impl StructDatabase {
    /// Creates a database with every count at zero.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::TypeCodeMismatch`] if an entry's type code does
    /// not equal its index, or [`SchemaError::EmptyFieldList`] if a
    /// field-list entry has no fields.
    pub fn new(name: &'static str, entries: &'static [StructInfo]) -> Result<Self, SchemaError> {
        for (index, entry) in entries.iter().enumerate() {
            if usize::try_from(entry.type_code).ok() != Some(index) {
                return Err(SchemaError::TypeCodeMismatch {
                    index,
                    type_code: entry.type_code,
                });
            }
            if let StructParser::Fields(fields) = entry.parser {
                if fields.is_empty() {
                    return Err(SchemaError::EmptyFieldList { type_code: entry.type_code });
                }
            }
        }

        Ok(Self {
            name,
            entries,
            counts: vec![0; entries.len()],
        })
    }

    /// Display name of the structure family.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The structure types, indexed by type code.
    #[must_use]
    pub fn entries(&self) -> &'static [StructInfo] {
        self.entries
    }

    /// Instance count of `type_code`, or `None` for unknown types.
    #[must_use]
    pub fn count(&self, type_code: u32) -> Option<u32> {
        self.counts.get(usize::try_from(type_code).ok()?).copied()
    }

    /// Sets every instance count to zero.
    pub fn reset_counts(&mut self) {
        self.counts.iter_mut().for_each(|count| *count = 0);
    }

    /// Returns `true` if `type_code` is defined and may appear on `target`.
    #[must_use]
    pub fn is_type_valid(&self, type_code: u32, target: ArchCompat) -> bool {
        usize::try_from(type_code)
            .ok()
            .and_then(|index| self.entries.get(index))
            .is_some_and(|entry| entry.compat.intersects(target))
    }

    /// Decodes one structure instance of type `type_code`.
    ///
    /// `data` covers exactly the structure; `offset` is its position in the
    /// table and is only printed. Returns `false` for unknown or
    /// unimplemented types. Unknown types leave every count untouched;
    /// unimplemented types are still counted.
    pub fn parse_struct(
        &mut self,
        session: &mut Session<'_>,
        indent: usize,
        data: &[u8],
        offset: usize,
        type_code: u32,
        args: StructArgs<'_>,
    ) -> bool {
        session.print_field_name(indent, "* Offset *");
        session.print(format_args!("0x{offset:x}\n"));

        let Some(index) = usize::try_from(type_code)
            .ok()
            .filter(|&index| index < self.entries.len())
        else {
            session.error(format_args!("Unknown {}. Type = {}", self.name, type_code));
            return false;
        };

        let entry = self.entries[index];
        let instance = self.counts[index];

        match entry.parser {
            StructParser::Func(func) => {
                let call = StructCall {
                    name: entry.name,
                    index: instance,
                    indent,
                    args,
                };
                func(session, &call, data);
            }
            StructParser::Fields(fields) => {
                let label = format!("{} [{}]", entry.name, instance);
                parse_fields(session, true, indent, Some(&label), data, fields);
            }
            StructParser::NotImplemented => {
                self.counts[index] = instance.saturating_add(1);
                session.error(format_args!(
                    "Parsing of {} Structure is not implemented",
                    entry.name
                ));
                return false;
            }
        }

        self.counts[index] = instance.saturating_add(1);
        true
    }

    /// Prints the per-type breakdown and checks architecture compatibility.
    ///
    /// Counts of types allowed on the session's target are printed, zero
    /// included. A non-zero count of a disallowed type is an error. Returns
    /// `true` if no disallowed type was seen.
    pub fn validate_counts(&self, session: &mut Session<'_>) -> bool {
        let target = session.config().target;
        let mut all_valid = true;

        session.print(format_args!("\nTable Breakdown:\n"));

        for (index, entry) in self.entries.iter().enumerate() {
            let count = self.counts[index];
            if self.is_type_valid(entry.type_code, target) {
                let pad = INSTANCE_COUNT_INDENT;
                let width = OUTPUT_FIELD_COLUMN_WIDTH - pad;
                session.print(format_args!("{:pad$}{:<width$} : {count}\n", "", entry.name));
            } else if count > 0 {
                all_valid = false;
                session.error(format_args!(
                    "{} Structure is not valid for the target architecture (found {count})",
                    entry.name
                ));
            }
        }

        all_valid
    }
}
