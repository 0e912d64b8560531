//! `acpiview` --- a table-driven, `no_std` ACPI table decoder and validator.
//!
//! Tables are described declaratively: a record layout is a `const` list of
//! [`Field`] descriptors, and the variable-length structures that follow a
//! table's fixed part are described by a [`StructDatabase`] keyed by type
//! code. The engine walks raw table bytes with those descriptions, renders
//! every field through a [`Sink`], runs per-field validators, and tallies the
//! errors and warnings it detects in the [`Session`].
//!
//! Decoders for the MADT and PPTT are included; any other signature gets its
//! header traced.
//!
//! # Usage
//!
//! ```ignore
//! let mut sink = PlainSink::new();
//! let mut session = Session::new(&mut sink, Config::default());
//! tables::parse_table(&mut session, &bytes);
//! println!("{}", sink.as_str());
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

use core::fmt;

pub mod bytes;
pub mod config;
pub mod counters;
pub mod dump;
pub mod field;
pub mod gas;
pub mod header;
pub mod madt;
pub mod parser;
pub mod pptt;
pub mod session;
pub mod sink;
pub mod structdb;
pub mod tables;
pub mod walker;

// Re-export key types at crate root for convenience.
pub use bytes::FromBytes;
pub use config::{ArchCompat, Config};
pub use counters::Counters;
pub use field::{Field, FieldView, Format, Render, Validator, ValidatorContext};
pub use header::HeaderInfo;
pub use parser::{parse_fields, Parsed};
pub use session::Session;
pub use sink::{PlainSink, Sink, Style};
pub use structdb::{StructCall, StructDatabase, StructInfo, StructParser};
pub use walker::{walk_structs, WalkStatus};

/// Errors detected while building a structure database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// An entry's type code does not equal its position in the table.
    TypeCodeMismatch {
        /// Position of the offending entry.
        index: usize,
        /// Type code the entry declares.
        type_code: u32,
    },
    /// A field-list entry has no fields.
    EmptyFieldList {
        /// Type code of the offending entry.
        type_code: u32,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeCodeMismatch { index, type_code } => write!(
                f,
                "structure database entry {index} declares type code {type_code}"
            ),
            Self::EmptyFieldList { type_code } => {
                write!(f, "structure type {type_code} has an empty field list")
            }
        }
    }
}

impl core::error::Error for SchemaError {}
