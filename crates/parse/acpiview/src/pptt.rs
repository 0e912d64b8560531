//! Processor Properties Topology Table (PPTT).

use alloc::format;

use crate::bytes::FromBytes;
use crate::config::ArchCompat;
use crate::field::{dump_chars, Field, Format, ValidatorContext};
use crate::header::HEADER_FIELDS;
use crate::parser::parse_fields;
use crate::session::Session;
use crate::structdb::{StructCall, StructDatabase, StructInfo};
use crate::walker::walk_structs;

/// PPTT signature.
pub const PPTT_SIGNATURE: &[u8; 4] = b"PPTT";

/// Upper bound on the number of sets when ARMv8.3-CCIDX is implemented.
pub const PPTT_ARM_CCIDX_CACHE_NUMBER_OF_SETS_MAX: u32 = 1 << 24;
/// Upper bound on the number of sets without ARMv8.3-CCIDX.
pub const PPTT_ARM_CACHE_NUMBER_OF_SETS_MAX: u32 = 1 << 15;
/// Smallest cache line size on Arm, in bytes.
pub const PPTT_ARM_CACHE_LINE_SIZE_MIN: u16 = 16;
/// Largest cache line size on Arm, in bytes.
pub const PPTT_ARM_CACHE_LINE_SIZE_MAX: u16 = 2048;

const PRIVATE_RESOURCE_COUNT: usize = 6;

fn validate_cache_number_of_sets(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    let Some(sets) = u32::read_from(data) else {
        return;
    };

    if sets == 0 {
        session.error(format_args!("Cache number of sets must be greater than 0"));
        return;
    }

    if !session.config().target.is_arm() {
        return;
    }

    if sets > PPTT_ARM_CCIDX_CACHE_NUMBER_OF_SETS_MAX {
        session.error(format_args!(
            "When ARMv8.3-CCIDX is implemented the maximum cache number of sets must be \
             less than or equal to {PPTT_ARM_CCIDX_CACHE_NUMBER_OF_SETS_MAX}"
        ));
    } else if sets > PPTT_ARM_CACHE_NUMBER_OF_SETS_MAX {
        session.warning(format_args!(
            "Without ARMv8.3-CCIDX, the maximum cache number of sets must be less than or \
             equal to {PPTT_ARM_CACHE_NUMBER_OF_SETS_MAX}. Ignore this message if \
             ARMv8.3-CCIDX is implemented"
        ));
    }
}

fn validate_cache_associativity(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    if data.first() == Some(&0) {
        session.error(format_args!("Cache associativity must be greater than 0"));
    }
}

fn validate_cache_line_size(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    // CCSIDR_EL1.LineSize encodes log2(bytes) - 4, so only Arm has bounds.
    if !session.config().target.is_arm() {
        return;
    }
    let Some(line_size) = u16::read_from(data) else {
        return;
    };

    if !(PPTT_ARM_CACHE_LINE_SIZE_MIN..=PPTT_ARM_CACHE_LINE_SIZE_MAX).contains(&line_size) {
        session.error(format_args!(
            "The cache line size must be between {PPTT_ARM_CACHE_LINE_SIZE_MIN} and \
             {PPTT_ARM_CACHE_LINE_SIZE_MAX} bytes on ARM Platforms."
        ));
    } else if !line_size.is_power_of_two() {
        session.error(format_args!("The cache line size is not a power of 2."));
    }
}

fn validate_cache_attributes(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    if data.first().is_some_and(|&attributes| attributes & 0xE0 != 0) {
        session.error(format_args!(
            "Attributes bits [7:5] are reserved and must be zero."
        ));
    }
}

/// Fixed part of the PPTT: the table header alone.
pub const PPTT_FIELDS: [Field; 9] = HEADER_FIELDS;

const PROCESSOR_FIELDS: [Field; 7] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("Flags", 4, 4).format(Format::Hex),
    Field::new("Parent", 4, 8).format(Format::Hex),
    Field::new("ACPI Processor ID", 4, 12).format(Format::Hex),
    Field::new("Number of private resources", 4, 16)
        .format(Format::Decimal)
        .capture(),
];

const CACHE_FIELDS: [Field; 10] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("Flags", 4, 4).format(Format::Hex),
    Field::new("Next Level of Cache", 4, 8).format(Format::Hex),
    Field::new("Size", 4, 12).format(Format::Hex),
    Field::new("Number of sets", 4, 16)
        .format(Format::Decimal)
        .validate(validate_cache_number_of_sets),
    Field::new("Associativity", 1, 20)
        .format(Format::Decimal)
        .validate(validate_cache_associativity),
    Field::new("Attributes", 1, 21)
        .format(Format::Hex)
        .validate(validate_cache_attributes),
    Field::new("Line size", 2, 22)
        .format(Format::Decimal)
        .validate(validate_cache_line_size),
];

const ID_FIELDS: [Field; 9] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("VENDOR_ID", 4, 4).renderer(dump_chars::<4>),
    Field::new("LEVEL_1_ID", 8, 8).format(Format::Hex),
    Field::new("LEVEL_2_ID", 8, 16).format(Format::Hex),
    Field::new("MAJOR_REV", 2, 24).format(Format::Hex),
    Field::new("MINOR_REV", 2, 26).format(Format::Hex),
    Field::new("SPIN_REV", 2, 28).format(Format::Hex),
];

/// Traces a processor hierarchy node followed by its private resource
/// references.
fn dump_processor_node(session: &mut Session<'_>, call: &StructCall<'_>, data: &[u8]) {
    let label = format!("{} [{}]", call.name, call.index);
    let parsed = parse_fields(session, true, call.indent, Some(&label), data, &PROCESSOR_FIELDS);

    let Some(count) = parsed.read::<u32>(PRIVATE_RESOURCE_COUNT) else {
        session.error(format_args!(
            "Insufficient {} Structure length. Length = {}.",
            call.name,
            data.len()
        ));
        return;
    };

    let offset = parsed.consumed();
    let resources = data.get(offset..).unwrap_or(&[]);
    let count_usize = usize::try_from(count).unwrap_or(usize::MAX);
    let fits = count_usize
        .checked_mul(size_of::<u32>())
        .is_some_and(|needed| needed <= resources.len());
    if !fits {
        session.error(format_args!(
            "Invalid Number of Private Resources. PrivateResourceCount = {}. \
             RemainingBufferLength = {}. Parsing of this structure aborted.",
            count,
            resources.len()
        ));
        return;
    }

    for (index, reference) in resources
        .chunks_exact(size_of::<u32>())
        .filter_map(u32::read_from)
        .take(count_usize)
        .enumerate()
    {
        session.print_field_name(4, &format!("Private resource [{index}]"));
        session.print(format_args!("0x{reference:x}\n"));
    }
}

/// Processor topology structure types, indexed by type code.
pub static PPTT_STRUCTS: [StructInfo; 3] = [
    StructInfo::func("Processor", 0, ArchCompat::all(), dump_processor_node),
    StructInfo::fields("Cache", 1, ArchCompat::all(), &CACHE_FIELDS),
    StructInfo::fields("ID", 2, ArchCompat::all(), &ID_FIELDS),
];

/// Traces the PPTT and every processor topology structure in it.
///
/// `table` must cover exactly the table's declared length.
pub fn parse_pptt(session: &mut Session<'_>, table: &[u8], _revision: u8) {
    let mut db = match StructDatabase::new("Processor Topology Structure", &PPTT_STRUCTS) {
        Ok(db) => db,
        Err(err) => {
            session.error(format_args!("{err}"));
            return;
        }
    };

    let offset = parse_fields(session, true, 0, Some("PPTT"), table, &PPTT_FIELDS).consumed();
    walk_structs(session, table, offset, &mut db);
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::String;
    use std::vec::Vec;

    use super::*;
    use crate::config::Config;
    use crate::header::tests::header;
    use crate::sink::PlainSink;

    fn processor(resources: &[u32], declared: u32) -> Vec<u8> {
        let length = 20 + 4 * resources.len();
        let mut v = std::vec![0u8, u8::try_from(length).unwrap(), 0, 0];
        v.extend_from_slice(&1u32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&7u32.to_le_bytes());
        v.extend_from_slice(&declared.to_le_bytes());
        for r in resources {
            v.extend_from_slice(&r.to_le_bytes());
        }
        v
    }

    fn cache(sets: u32, associativity: u8, attributes: u8, line_size: u16) -> Vec<u8> {
        let mut v = std::vec![1u8, 24, 0, 0];
        v.extend_from_slice(&0xFFu32.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&0x8000u32.to_le_bytes());
        v.extend_from_slice(&sets.to_le_bytes());
        v.push(associativity);
        v.push(attributes);
        v.extend_from_slice(&line_size.to_le_bytes());
        v
    }

    fn id() -> Vec<u8> {
        let mut v = std::vec![2u8, 30, 0, 0];
        v.extend_from_slice(b"ARMH");
        v.extend_from_slice(&0x41u64.to_le_bytes());
        v.extend_from_slice(&0u64.to_le_bytes());
        v.extend_from_slice(&1u16.to_le_bytes());
        v.extend_from_slice(&2u16.to_le_bytes());
        v.extend_from_slice(&3u16.to_le_bytes());
        v
    }

    fn pptt(structs: &[Vec<u8>]) -> Vec<u8> {
        let length = 36 + structs.iter().map(Vec::len).sum::<usize>();
        let mut v = header(b"PPTT", u32::try_from(length).unwrap(), 2);
        for s in structs {
            v.extend_from_slice(s);
        }
        v
    }

    fn run(data: &[u8], target: ArchCompat) -> (u32, u32, String) {
        let config = Config {
            target,
            ..Config::default()
        };
        let mut sink = PlainSink::new();
        let mut session = Session::new(&mut sink, config);
        parse_pptt(&mut session, data, 2);
        let counters = session.counters();
        (counters.errors(), counters.warnings(), sink.into_string())
    }

    #[test]
    fn full_topology_decodes_cleanly() {
        let data = pptt(&[processor(&[0x24, 0x3C], 2), cache(256, 8, 0x0A, 64), id()]);
        let (errors, warnings, out) = run(&data, ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (0, 0));
        assert!(out.starts_with("PPTT"));
        assert!(out.contains("Processor [0]"));
        assert!(out.contains("Private resource [0]"));
        assert!(out.contains("Private resource [1]"));
        assert!(out.contains("0x3c\n"));
        assert!(out.contains("Cache [0]"));
        assert!(out.contains("ID [0]"));
        assert!(out.contains("ARMH"));
        assert!(out.lines().any(|line| line.trim_start().starts_with("Processor")
            && line.ends_with(": 1")));
    }

    #[test]
    fn second_processor_gets_next_index() {
        let data = pptt(&[processor(&[], 0), processor(&[], 0)]);
        let (errors, _, out) = run(&data, ArchCompat::all());
        assert_eq!(errors, 0);
        assert!(out.contains("Processor [1]"));
    }

    #[test]
    fn private_resources_must_fit() {
        let data = pptt(&[processor(&[0x24], 3)]);
        let (errors, _, out) = run(&data, ArchCompat::all());
        assert_eq!(errors, 1);
        assert!(out.contains("PrivateResourceCount = 3. RemainingBufferLength = 4."));
        assert!(!out.contains("Private resource [0]"));
    }

    #[test]
    fn short_processor_node_is_reported() {
        let mut node = processor(&[], 0);
        node.truncate(16);
        node[1] = 16;
        let data = pptt(&[node]);
        let (errors, _, out) = run(&data, ArchCompat::all());
        assert_eq!(errors, 1);
        assert!(out.contains("Insufficient Processor Structure length. Length = 16."));
    }

    #[test]
    fn cache_rules_on_arm() {
        let (errors, _, out) = run(&pptt(&[cache(0, 0, 0xE0, 60)]), ArchCompat::ARM_ANY);
        assert_eq!(errors, 4);
        assert!(out.contains("number of sets must be greater than 0"));
        assert!(out.contains("associativity must be greater than 0"));
        assert!(out.contains("bits [7:5] are reserved"));
        assert!(out.contains("is not a power of 2"));

        let (errors, warnings, _) = run(&pptt(&[cache(1 << 16, 4, 0, 4096)]), ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (1, 1));

        let (errors, _, out) = run(&pptt(&[cache((1 << 24) + 1, 4, 0, 64)]), ArchCompat::ARM_ANY);
        assert_eq!(errors, 1);
        assert!(out.contains("ARMv8.3-CCIDX is implemented the maximum"));
    }

    #[test]
    fn arm_only_cache_rules_skipped_elsewhere() {
        let data = pptt(&[cache(1 << 16, 4, 0, 4096)]);
        let (errors, warnings, _) = run(&data, ArchCompat::X64);
        assert_eq!((errors, warnings), (0, 0));
    }

    #[test]
    fn database_is_well_formed() {
        assert!(StructDatabase::new("Processor Topology Structure", &PPTT_STRUCTS).is_ok());
    }
}
