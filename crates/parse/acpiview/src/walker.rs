//! Walk over the self-length-prefixed structures that follow a table's
//! fixed fields.
//!
//! Every structure starts with a 1-byte type, a 1-byte length and two
//! reserved bytes, as in the MADT and PPTT.

use crate::field::Field;
use crate::parser::parse_fields;
use crate::session::Session;
use crate::structdb::StructDatabase;

const TYPE: usize = 0;
const LENGTH: usize = 1;

/// Lookahead list used to learn a structure's type and length before it is
/// dispatched.
pub const STRUCT_HEADER_FIELDS: [Field; 3] = [
    Field::hidden(1, 0).capture(),
    Field::new("Length", 1, 1).capture(),
    Field::new("Reserved", 2, 2),
];

/// Indent applied to every dispatched structure.
pub const STRUCT_INDENT: usize = 2;

/// How a structure walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    /// Every structure up to the end of the table was visited.
    Complete,
    /// The table ended before a structure header could be read.
    Truncated,
    /// A structure declared a zero length or a length past the table end.
    InvalidLength,
}

impl WalkStatus {
    /// Returns `true` if the walk reached the end of the table.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// Dispatches every structure in `table[offset..]` through `db`.
///
/// `table` must be exactly the table's declared length. The walk always
/// advances by the structure's declared length, whether or not the
/// structure could be decoded, and stops early on a truncated header or an
/// invalid length. Instance counts are reset before the first structure.
/// When the walk completes and consistency checking is enabled, the
/// database's counts are validated.
pub fn walk_structs(
    session: &mut Session<'_>,
    table: &[u8],
    mut offset: usize,
    db: &mut StructDatabase,
) -> WalkStatus {
    let table_length = table.len();
    db.reset_counts();

    while offset < table_length {
        let remaining = table.get(offset..).unwrap_or(&[]);
        let head = parse_fields(session, false, 0, None, remaining, &STRUCT_HEADER_FIELDS);

        let (Some(struct_type), Some(struct_length)) =
            (head.read::<u8>(TYPE), head.read::<u8>(LENGTH))
        else {
            session.error(format_args!(
                "Insufficient remaining table buffer length to read the {} header. Length = {}.",
                db.name(),
                remaining.len()
            ));
            return WalkStatus::Truncated;
        };

        let struct_length = usize::from(struct_length);
        let Some(data) = table
            .get(offset..offset + struct_length)
            .filter(|_| struct_length != 0)
        else {
            session.error(format_args!(
                "Invalid {} length. Length = {}. Offset = {}. AcpiTableLength = {}.",
                db.name(),
                struct_length,
                offset,
                table_length
            ));
            return WalkStatus::InvalidLength;
        };

        db.parse_struct(
            session,
            STRUCT_INDENT,
            data,
            offset,
            u32::from(struct_type),
            [None, None],
        );

        offset += struct_length;
    }

    if session.consistency_checking() {
        db.validate_counts(session);
    }

    WalkStatus::Complete
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String;
    use std::vec::Vec;

    use super::*;
    use crate::config::{ArchCompat, Config};
    use crate::field::Format;
    use crate::sink::PlainSink;
    use crate::structdb::StructInfo;

    const ITEM: [Field; 4] = [
        Field::new("Type", 1, 0).format(Format::Hex),
        Field::new("Length", 1, 1).format(Format::Decimal),
        Field::new("Reserved", 2, 2).format(Format::Hex),
        Field::new("Value", 4, 4).format(Format::Hex),
    ];

    static ENTRIES: [StructInfo; 2] = [
        StructInfo::fields("Item", 0, ArchCompat::all(), &ITEM),
        StructInfo::not_implemented("Legacy", 1, ArchCompat::all()),
    ];

    /// Builds a table with a 4-byte prefix followed by the given structures.
    fn table(structs: &[&[u8]]) -> Vec<u8> {
        let mut v = std::vec![0xAA; 4];
        for s in structs {
            v.extend_from_slice(s);
        }
        v
    }

    fn walk(data: &[u8], config: Config) -> (WalkStatus, StructDatabase, u32, String) {
        let mut db = StructDatabase::new("Item Structure", &ENTRIES).unwrap();
        let mut sink = PlainSink::new();
        let mut session = Session::new(&mut sink, config);
        let status = walk_structs(&mut session, data, 4, &mut db);
        let errors = session.counters().errors();
        (status, db, errors, sink.into_string())
    }

    const ITEM_A: [u8; 8] = [0, 8, 0, 0, 1, 0, 0, 0];
    const ITEM_B: [u8; 8] = [0, 8, 0, 0, 2, 0, 0, 0];

    #[test]
    fn visits_every_structure() {
        let data = table(&[&ITEM_A, &ITEM_B]);
        let (status, db, errors, out) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::Complete);
        assert_eq!(errors, 0);
        assert_eq!(db.count(0), Some(2));
        assert!(out.contains("Item [0]"));
        assert!(out.contains("Item [1]"));
        assert!(out.contains("Table Breakdown:"));
    }

    #[test]
    fn counts_restart_for_each_walk() {
        let data = table(&[&ITEM_A, &ITEM_B]);
        let mut db = StructDatabase::new("Item Structure", &ENTRIES).unwrap();
        let mut sink = PlainSink::new();
        let mut session = Session::new(&mut sink, Config::default());
        walk_structs(&mut session, &data, 4, &mut db);
        walk_structs(&mut session, &data, 4, &mut db);
        assert_eq!(db.count(0), Some(2));
        assert_eq!(session.counters().errors(), 0);
        drop(session);
        assert!(sink.as_str().contains("Item [1]"));
        assert!(!sink.as_str().contains("Item [2]"));
    }

    #[test]
    fn zero_length_aborts_walk() {
        let data = table(&[&ITEM_A, &[0, 0, 0, 0], &ITEM_B]);
        let (status, db, errors, out) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::InvalidLength);
        assert_eq!(errors, 1);
        assert_eq!(db.count(0), Some(1));
        assert!(out.contains("Invalid Item Structure length. Length = 0. Offset = 12."));
        assert!(!out.contains("Table Breakdown:"));
    }

    #[test]
    fn trailing_zero_length_reports_once() {
        let data = table(&[&ITEM_A, &[0, 0, 0, 0]]);
        let (status, _, errors, _) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::InvalidLength);
        assert_eq!(errors, 1);
    }

    #[test]
    fn overlong_structure_aborts_walk() {
        let data = table(&[&ITEM_A, &[0, 200, 0, 0]]);
        let (status, db, errors, out) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::InvalidLength);
        assert_eq!(errors, 1);
        assert_eq!(db.count(0), Some(1));
        assert!(out.contains("AcpiTableLength = 16."));
    }

    #[test]
    fn truncated_header_aborts_walk() {
        let data = table(&[&ITEM_A, &[0]]);
        let (status, _, errors, out) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::Truncated);
        assert_eq!(errors, 1);
        assert!(out.contains("Insufficient remaining table buffer length"));
        assert!(out.contains("Length = 1."));
    }

    #[test]
    fn undecodable_structures_still_advance() {
        let data = table(&[&[1, 4, 0, 0], &[9, 4, 0, 0], &ITEM_A]);
        let (status, db, errors, out) = walk(&data, Config::default());
        assert_eq!(status, WalkStatus::Complete);
        // One not-implemented and one unknown type.
        assert_eq!(errors, 2);
        assert_eq!(db.count(1), Some(1));
        assert_eq!(db.count(0), Some(1));
        assert!(out.contains("Item [0]"));
    }

    #[test]
    fn count_validation_skipped_without_consistency_checking() {
        let config = Config {
            consistency_checking: false,
            ..Config::default()
        };
        let data = table(&[&ITEM_A]);
        let (status, _, _, out) = walk(&data, config);
        assert!(status.is_complete());
        assert!(!out.contains("Table Breakdown:"));
    }
}
