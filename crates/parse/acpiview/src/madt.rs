//! Multiple APIC Description Table (MADT).
//!
//! The fixed part is followed by a list of interrupt controller structures.
//! Only the GIC structures used on Arm platforms are decoded; the x86 APIC
//! family is recognised and counted but not decoded.

use crate::bytes::FromBytes;
use crate::config::ArchCompat;
use crate::field::{dump_chars, Field, Format, ValidatorContext};
use crate::header::with_header;
use crate::parser::parse_fields;
use crate::session::Session;
use crate::structdb::{StructDatabase, StructInfo};
use crate::walker::walk_structs;

/// MADT signature.
pub const MADT_SIGNATURE: &[u8; 4] = b"APIC";

/// Lowest private peripheral interrupt ID.
pub const ARM_PPI_ID_MIN: u16 = 16;
/// Highest private peripheral interrupt ID.
pub const ARM_PPI_ID_MAX: u16 = 31;
/// Lowest extended PPI ID (GICv3.1).
pub const ARM_PPI_ID_EXTENDED_MIN: u16 = 1056;
/// Highest extended PPI ID (GICv3.1).
pub const ARM_PPI_ID_EXTENDED_MAX: u16 = 1119;
/// PPI ID the SBSA assigns to the statistical profiling buffer interrupt.
pub const ARM_PPI_ID_PMBIRQ: u16 = 21;

/// Type code of the GIC distributor structure.
pub const GICD: u32 = 12;

fn validate_gicd_system_vector_base(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    if u32::read_from(data).is_some_and(|base| base != 0) {
        session.error(format_args!("System Vector Base must be zero."));
    }
}

fn validate_spe_overflow_interrupt(
    session: &mut Session<'_>,
    data: &[u8],
    _: Option<ValidatorContext>,
) {
    let Some(interrupt) = u16::read_from(data) else {
        return;
    };

    // Zero means SPE is not implemented.
    if interrupt == 0 {
        return;
    }

    let in_ppi_range = (ARM_PPI_ID_MIN..=ARM_PPI_ID_MAX).contains(&interrupt)
        || (ARM_PPI_ID_EXTENDED_MIN..=ARM_PPI_ID_EXTENDED_MAX).contains(&interrupt);

    if !in_ppi_range {
        session.error(format_args!(
            "SPE Overflow Interrupt ID of {interrupt} is not in the allowed PPI ID ranges of \
             {ARM_PPI_ID_MIN}-{ARM_PPI_ID_MAX} or \
             {ARM_PPI_ID_EXTENDED_MIN}-{ARM_PPI_ID_EXTENDED_MAX} (for GICv3.1 or later)."
        ));
    } else if interrupt != ARM_PPI_ID_PMBIRQ {
        session.warning(format_args!(
            "SPE Overflow Interrupt ID of {interrupt} is not compliant with SBSA Level 3 PPI ID \
             assignment: {ARM_PPI_ID_PMBIRQ}."
        ));
    }
}

/// Fixed part of the MADT.
pub const MADT_FIELDS: [Field; 11] = with_header([
    Field::new("Local Interrupt Controller Address", 4, 36).format(Format::Hex),
    Field::new("Flags", 4, 40).format(Format::Hex),
]);

const GICC_FIELDS: [Field; 18] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("CPU Interface Number", 4, 4).format(Format::Hex),
    Field::new("ACPI Processor UID", 4, 8).format(Format::Hex),
    Field::new("Flags", 4, 12).format(Format::Hex),
    Field::new("Parking Protocol Version", 4, 16).format(Format::Hex),
    Field::new("Performance Interrupt GSIV", 4, 20).format(Format::Hex),
    Field::new("Parked Address", 8, 24).format(Format::Hex),
    Field::new("Physical Base Address", 8, 32).format(Format::Hex),
    Field::new("GICV", 8, 40).format(Format::Hex),
    Field::new("GICH", 8, 48).format(Format::Hex),
    Field::new("VGIC Maintenance interrupt", 4, 56).format(Format::Hex),
    Field::new("GICR Base Address", 8, 60).format(Format::Hex),
    Field::new("MPIDR", 8, 68).format(Format::Hex),
    Field::new("Processor Power Efficiency Class", 1, 76).format(Format::Hex),
    Field::new("Reserved", 1, 77).format(Format::Hex),
    Field::new("SPE overflow Interrupt", 2, 78)
        .format(Format::Hex)
        .validate(validate_spe_overflow_interrupt),
];

const GICD_FIELDS: [Field; 8] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("GIC ID", 4, 4).format(Format::Hex),
    Field::new("Physical Base Address", 8, 8).format(Format::Hex),
    Field::new("System Vector Base", 4, 16)
        .format(Format::Hex)
        .validate(validate_gicd_system_vector_base),
    Field::new("GIC Version", 1, 20).format(Format::Decimal),
    Field::new("Reserved", 3, 21).render_with(dump_chars::<3>, Some(Format::Hex)),
];

const GIC_MSI_FRAME_FIELDS: [Field; 8] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("MSI Frame ID", 4, 4).format(Format::Hex),
    Field::new("Physical Base Address", 8, 8).format(Format::Hex),
    Field::new("Flags", 4, 16).format(Format::Hex),
    Field::new("SPI Count", 2, 20).format(Format::Decimal),
    Field::new("SPI Base", 2, 22).format(Format::Hex),
];

const GICR_FIELDS: [Field; 5] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("Discovery Range Base Address", 8, 4).format(Format::Hex),
    Field::new("Discovery Range Length", 4, 12).format(Format::Hex),
];

const GIC_ITS_FIELDS: [Field; 6] = [
    Field::new("Type", 1, 0).format(Format::Hex),
    Field::new("Length", 1, 1).format(Format::Decimal),
    Field::new("Reserved", 2, 2).format(Format::Hex),
    Field::new("GIC ITS ID", 4, 4).format(Format::Hex),
    Field::new("Physical Base Address", 8, 8).format(Format::Hex),
    Field::new("Reserved", 4, 16).format(Format::Hex),
];

/// Interrupt controller structure types, indexed by type code.
pub static MADT_STRUCTS: [StructInfo; 16] = [
    StructInfo::not_implemented("Processor Local APIC", 0, ArchCompat::X86),
    StructInfo::not_implemented("I/O APIC", 1, ArchCompat::X86),
    StructInfo::not_implemented("Interrupt Source Override", 2, ArchCompat::X86),
    StructInfo::not_implemented("NMI Source", 3, ArchCompat::X86),
    StructInfo::not_implemented("Local APIC NMI", 4, ArchCompat::X86),
    StructInfo::not_implemented("Local APIC Address Override", 5, ArchCompat::X86),
    StructInfo::not_implemented("I/O SAPIC", 6, ArchCompat::X86),
    StructInfo::not_implemented("Local SAPIC", 7, ArchCompat::X86),
    StructInfo::not_implemented("Platform Interrupt Sources", 8, ArchCompat::X86),
    StructInfo::not_implemented("Processor Local x2APIC", 9, ArchCompat::X86),
    StructInfo::not_implemented("Local x2APIC NMI", 10, ArchCompat::X86),
    StructInfo::fields("GICC", 11, ArchCompat::ARM_ANY, &GICC_FIELDS),
    StructInfo::fields("GICD", GICD, ArchCompat::ARM_ANY, &GICD_FIELDS),
    StructInfo::fields("GIC MSI Frame", 13, ArchCompat::ARM_ANY, &GIC_MSI_FRAME_FIELDS),
    StructInfo::fields("GICR", 14, ArchCompat::ARM_ANY, &GICR_FIELDS),
    StructInfo::fields("GIC ITS", 15, ArchCompat::ARM_ANY, &GIC_ITS_FIELDS),
];

/// Traces the MADT and every interrupt controller structure in it.
///
/// `table` must cover exactly the table's declared length.
pub fn parse_madt(session: &mut Session<'_>, table: &[u8], _revision: u8) {
    let mut db = match StructDatabase::new("Interrupt Controller Structure", &MADT_STRUCTS) {
        Ok(db) => db,
        Err(err) => {
            session.error(format_args!("{err}"));
            return;
        }
    };

    let offset = parse_fields(session, true, 0, Some("MADT"), table, &MADT_FIELDS).consumed();
    let status = walk_structs(session, table, offset, &mut db);

    if status.is_complete()
        && session.consistency_checking()
        && db.count(GICD).is_some_and(|count| count > 1)
    {
        session.error(format_args!("Only one GICD must be present"));
    }
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

    fn gicc(uid: u32, spe: u16) -> Vec<u8> {
        let mut v = std::vec![0u8; 80];
        v[0] = 11;
        v[1] = 80;
        v[8..12].copy_from_slice(&uid.to_le_bytes());
        v[68..76].copy_from_slice(&0x8000_0100u64.to_le_bytes());
        v[78..80].copy_from_slice(&spe.to_le_bytes());
        v
    }

    fn gicd(vector_base: u32) -> Vec<u8> {
        let mut v = std::vec![0u8; 24];
        v[0] = 12;
        v[1] = 24;
        v[8..16].copy_from_slice(&0x2f00_0000u64.to_le_bytes());
        v[16..20].copy_from_slice(&vector_base.to_le_bytes());
        v[20] = 3;
        v
    }

    fn madt(structs: &[Vec<u8>]) -> Vec<u8> {
        let length = 44 + structs.iter().map(Vec::len).sum::<usize>();
        let mut v = header(b"APIC", u32::try_from(length).unwrap(), 5);
        v.extend_from_slice(&0u32.to_le_bytes());
        v.extend_from_slice(&1u32.to_le_bytes());
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
        parse_madt(&mut session, data, 5);
        let counters = session.counters();
        (counters.errors(), counters.warnings(), sink.into_string())
    }

    #[test]
    fn arm_madt_decodes_cleanly() {
        let data = madt(&[gicc(0, 21), gicc(1, 21), gicd(0)]);
        let (errors, warnings, out) = run(&data, ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (0, 0));
        assert!(out.starts_with("MADT"));
        assert!(out.contains("GICC [0]"));
        assert!(out.contains("GICC [1]"));
        assert!(out.contains("GICD [0]"));
        assert!(out.contains("0x80000100"));
        assert!(out.contains("0 0 0"));
        assert!(out.contains("Table Breakdown:"));
        assert!(!out.contains("Processor Local APIC"));
    }

    #[test]
    fn duplicate_gicd_is_an_error() {
        let data = madt(&[gicd(0), gicd(0)]);
        let (errors, _, out) = run(&data, ArchCompat::ARM_ANY);
        assert_eq!(errors, 1);
        assert!(out.contains("Only one GICD must be present"));
    }

    #[test]
    fn gicd_vector_base_must_be_zero() {
        let data = madt(&[gicd(0x20)]);
        let (errors, _, out) = run(&data, ArchCompat::ARM_ANY);
        assert_eq!(errors, 1);
        assert!(out.contains("System Vector Base must be zero."));
    }

    #[test]
    fn spe_interrupt_ranges() {
        let (errors, warnings, _) = run(&madt(&[gicc(0, 0)]), ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (0, 0));

        let (errors, warnings, out) = run(&madt(&[gicc(0, 23)]), ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (0, 1));
        assert!(out.contains("not compliant with SBSA Level 3"));

        let (errors, warnings, _) = run(&madt(&[gicc(0, 1060)]), ArchCompat::ARM_ANY);
        assert_eq!((errors, warnings), (0, 1));

        let (errors, _, out) = run(&madt(&[gicc(0, 40)]), ArchCompat::ARM_ANY);
        assert_eq!(errors, 1);
        assert!(out.contains("16-31 or 1056-1119"));
    }

    #[test]
    fn x86_structures_are_counted_but_not_decoded() {
        let lapic = std::vec![0u8, 8, 0, 1, 1, 0, 0, 0];
        let data = madt(&[lapic.clone(), lapic]);
        let (errors, _, out) = run(&data, ArchCompat::X86);
        assert_eq!(errors, 2);
        assert!(out.contains("Parsing of Processor Local APIC Structure is not implemented"));
        assert!(out.contains("Processor Local APIC"));
        assert!(out.lines().any(|line| line.trim_start().starts_with("Processor Local APIC")
            && line.ends_with(": 2")));
    }

    #[test]
    fn gic_structures_rejected_on_x86_target() {
        let data = madt(&[gicd(0)]);
        let (errors, _, out) = run(&data, ArchCompat::X86);
        assert_eq!(errors, 1);
        assert!(out.contains("GICD Structure is not valid for the target architecture (found 1)"));
    }

    #[test]
    fn bad_structure_length_skips_gicd_check() {
        let mut bad = gicd(0);
        bad[1] = 200;
        let data = madt(&[gicd(0), gicd(0), bad]);
        let (errors, _, out) = run(&data, ArchCompat::ARM_ANY);
        assert_eq!(errors, 1);
        assert!(out.contains("Invalid Interrupt Controller Structure length"));
        assert!(!out.contains("Only one GICD"));
    }

    #[test]
    fn database_is_well_formed() {
        let db = StructDatabase::new("Interrupt Controller Structure", &MADT_STRUCTS).unwrap();
        assert_eq!(db.entries()[GICD as usize].name(), "GICD");
    }
}
