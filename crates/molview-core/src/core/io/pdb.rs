use super::error::{ParseError, parse_float, parse_int, slice_and_trim};
use super::traits::{StructureFile, StructureWriter};
use crate::core::models::atom::Atom;
use crate::core::models::bounding_box::BoundingBox;
use crate::core::models::builder::{StructureBuilder, chain_letter};
use crate::core::models::frame::PrimaryStructureFrame;
use crate::core::models::structure::PrimaryStructure;
use crate::core::tables::elements::Element;
use nalgebra::Vector3;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use tracing::debug;

const MAX_TITLE_LEN: usize = 256;
const ANGSTROM_PER_NM: f32 = 10.0;
const MAX_SERIAL: usize = 100_000;
const MAX_RESIDUE_NUMBER: usize = 10_000;

/// Which atoms [`PdbFile::write_with`] emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdbAtomSelection {
    /// Every atom of the structure.
    #[default]
    All,
    /// Atoms of main-chain residues only, without heteroatoms and hydrogens.
    MainChainResidues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdbWriteOptions {
    pub selection: PdbAtomSelection,
}

pub struct PdbFile;

impl StructureFile for PdbFile {
    fn read_from(reader: &mut impl BufRead) -> Result<PrimaryStructure, ParseError> {
        let mut builder = StructureBuilder::default();
        let mut title = String::new();
        let mut current_chain: Option<String> = None;
        let mut current_residue: Option<(i32, String)> = None;
        let mut force_new_chain = false;

        for (line_idx, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_no = line_idx + 1;
            let tag = slice_and_trim(&line, 0, 6);

            match tag {
                "TITLE" => {
                    let text = slice_and_trim(&line, 10, 80);
                    if !text.is_empty() {
                        if !title.is_empty() {
                            title.push(' ');
                        }
                        title.push_str(text);
                    }
                }
                "CRYST1" => {
                    let lengths = Vector3::new(
                        parse_float(slice_and_trim(&line, 6, 15), line_no, "6-15")?,
                        parse_float(slice_and_trim(&line, 15, 24), line_no, "15-24")?,
                        parse_float(slice_and_trim(&line, 24, 33), line_no, "24-33")?,
                    ) / ANGSTROM_PER_NM;
                    let angles = Vector3::new(
                        parse_float(slice_and_trim(&line, 33, 40), line_no, "33-40")?,
                        parse_float(slice_and_trim(&line, 40, 47), line_no, "40-47")?,
                        parse_float(slice_and_trim(&line, 47, 54), line_no, "47-54")?,
                    );
                    builder.set_bounding_box(Some(BoundingBox::from_lengths_angles(lengths, angles)));
                }
                "ATOM" | "HETATM" => {
                    let serial: i32 = parse_int(slice_and_trim(&line, 6, 11), line_no, "6-11")?;
                    let atom_name = slice_and_trim(&line, 12, 16);
                    let residue_name = slice_and_trim(&line, 17, 20);
                    let chain_id = slice_and_trim(&line, 21, 22);
                    let residue_id: i32 =
                        parse_int(slice_and_trim(&line, 22, 26), line_no, "22-26")?;
                    let position = nalgebra::Point3::new(
                        parse_float(slice_and_trim(&line, 30, 38), line_no, "30-38")?,
                        parse_float(slice_and_trim(&line, 38, 46), line_no, "38-46")?,
                        parse_float(slice_and_trim(&line, 46, 54), line_no, "46-54")?,
                    ) / ANGSTROM_PER_NM;
                    let element = Element::from_symbol(slice_and_trim(&line, 76, 78));

                    if force_new_chain || current_chain.as_deref() != Some(chain_id) {
                        let id = if chain_id.is_empty() {
                            chain_letter(builder.chain_count())
                        } else {
                            chain_id.to_string()
                        };
                        builder.start_chain(&id);
                        current_chain = Some(chain_id.to_string());
                        current_residue = None;
                        force_new_chain = false;
                    }

                    let key = (residue_id, residue_name.to_string());
                    if current_residue.as_ref() != Some(&key) {
                        builder.start_residue(residue_id, residue_name);
                        current_residue = Some(key);
                    }

                    builder.add_atom(serial, atom_name, element, position, tag == "HETATM");
                }
                "TER" => force_new_chain = true,
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }

        builder.set_title(truncate_chars(&title, MAX_TITLE_LEN));
        let structure = builder.build();
        debug!(
            atoms = structure.atom_count(),
            residues = structure.residue_count(),
            chains = structure.chains().len(),
            "Parsed PDB structure"
        );
        Ok(structure)
    }
}

fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((i, _)) => &value[..i],
        None => value,
    }
}

/// Atom name in columns 13-16: names shorter than four characters with a one-letter
/// element start in column 14.
fn format_atom_name(atom: &Atom) -> String {
    let name = truncate_chars(&atom.name, 4);
    if name.len() < 4 && atom.element.symbol().len() == 1 {
        format!(" {:<3}", name)
    } else {
        format!("{:<4}", name)
    }
}

impl PdbFile {
    /// Writes `structure` as PDB records.
    ///
    /// Residue numbers are the residue indices of the structure wrapped to four digits, so
    /// neighbouring residues stay distinct when re-read even if the source numbering repeats.
    /// Serials wrap to five digits. Coordinates come from `frame` when given.
    pub fn write_with(
        structure: &PrimaryStructure,
        frame: Option<&PrimaryStructureFrame>,
        options: &PdbWriteOptions,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        if !structure.title.is_empty() {
            writeln!(writer, "TITLE     {}", truncate_chars(&structure.title, 70))?;
        }

        let cell = structure
            .bounding_box
            .unwrap_or_else(|| BoundingBox::rectangular(0.1, 0.1, 0.1));
        let lengths = cell.lengths() * ANGSTROM_PER_NM;
        let angles = cell.angles();
        writeln!(
            writer,
            "CRYST1{:>9.3}{:>9.3}{:>9.3}{:>7.2}{:>7.2}{:>7.2} P 1           1",
            lengths.x, lengths.y, lengths.z, angles.x, angles.y, angles.z
        )?;

        let main_chain_residues: Option<HashSet<usize>> = match options.selection {
            PdbAtomSelection::All => None,
            PdbAtomSelection::MainChainResidues => Some(
                structure
                    .chains()
                    .iter()
                    .flat_map(|c| c.main_chain_residues().iter().copied())
                    .collect(),
            ),
        };

        let mut serial = 0usize;
        let mut open_chain: Option<usize> = None;
        let mut last_atom: Option<&Atom> = None;

        for atom in structure.atoms() {
            if let Some(residues) = &main_chain_residues {
                if !residues.contains(&atom.residue_index) || atom.het_atom || atom.is_hydrogen()
                {
                    continue;
                }
            }

            let residue = structure.residue_of(atom);
            let chain_index = residue.and_then(|r| r.chain_index());
            if open_chain.is_some() && chain_index != open_chain {
                if let Some(last) = last_atom {
                    serial += 1;
                    write_ter(writer, serial, last)?;
                }
            }
            open_chain = chain_index;

            let position = frame
                .and_then(|f| f.position(atom.index))
                .unwrap_or(atom.position)
                * ANGSTROM_PER_NM;
            let residue_number = residue.map_or(0, |r| r.index) % MAX_RESIDUE_NUMBER;
            let residue_name = if atom.residue_name.is_empty() {
                "UNK"
            } else {
                truncate_chars(&atom.residue_name, 3)
            };
            let chain_id = atom.chain_id.chars().next().unwrap_or(' ');

            serial += 1;
            writeln!(
                writer,
                "{:<6}{:>5} {} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                if atom.het_atom { "HETATM" } else { "ATOM" },
                serial % MAX_SERIAL,
                format_atom_name(atom),
                residue_name,
                chain_id,
                residue_number,
                position.x,
                position.y,
                position.z,
                1.0,
                0.0,
                atom.element.symbol().to_ascii_uppercase()
            )?;
            last_atom = Some(atom);
        }

        if open_chain.is_some() {
            if let Some(last) = last_atom {
                serial += 1;
                write_ter(writer, serial, last)?;
            }
        }
        writeln!(writer, "END")
    }
}

fn write_ter(writer: &mut impl Write, serial: usize, last: &Atom) -> io::Result<()> {
    let residue_name = if last.residue_name.is_empty() {
        "UNK"
    } else {
        truncate_chars(&last.residue_name, 3)
    };
    writeln!(
        writer,
        "TER   {:>5}      {:>3} {}{:>4}",
        serial % MAX_SERIAL,
        residue_name,
        last.chain_id.chars().next().unwrap_or(' '),
        last.residue_index % MAX_RESIDUE_NUMBER
    )
}

impl StructureWriter for PdbFile {
    fn write_to(
        structure: &PrimaryStructure,
        frame: Option<&PrimaryStructureFrame>,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        Self::write_with(structure, frame, &PdbWriteOptions::default(), writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::error::ParseErrorKind;
    use crate::core::tables::residues::StandardResidue;
    use nalgebra::Point3;
    use std::io::Cursor;

    const DIPEPTIDE: &str = "\
TITLE     SMALL TEST PEPTIDE
CRYST1   30.000   40.000   50.000  90.00  90.00  90.00 P 1           1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  C   ALA A   1      13.140   5.986  -5.142  1.00  0.00           C
ATOM      4  O   ALA A   1      13.744   5.914  -6.216  1.00  0.00           O
ATOM      5  H   ALA A   1      10.104   6.134  -6.504  1.00  0.00           H
ATOM      6  N   GLY A   2      13.778   5.994  -3.976  1.00  0.00           N
ATOM      7  CA  GLY A   2      15.224   5.915  -3.835  1.00  0.00           C
ATOM      8  C   GLY A   2      15.654   5.836  -2.381  1.00  0.00           C
ATOM      9  O   GLY A   2      14.825   5.844  -1.470  1.00  0.00           O
TER      10      GLY A   2
ATOM     11  N   GLY A   3      20.000   5.994  -3.976  1.00  0.00           N
HETATM   12 ZN    ZN B 101      20.000  20.000  20.000  1.00  0.00          ZN
HETATM   13  O   HOH B 201      25.000  20.000  20.000  1.00  0.00           O
END
ATOM     14  N   ALA C   1       0.000   0.000   0.000  1.00  0.00           N
";

    fn read(text: &str) -> PrimaryStructure {
        PdbFile::read_from(&mut Cursor::new(text.as_bytes())).unwrap()
    }

    #[test]
    fn atom_records_are_read_in_nanometres() {
        let structure = read(DIPEPTIDE);
        assert_eq!(structure.title, "SMALL TEST PEPTIDE");
        assert_eq!(structure.atom_count(), 13);
        let ca = structure.atom(1).unwrap();
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.element, Element::C);
        assert_eq!(ca.residue_name, "ALA");
        assert_eq!(ca.chain_id, "A");
        assert!((ca.position.x - 1.1639).abs() < 1e-5);
        let bbox = structure.bounding_box.unwrap();
        assert!((bbox.lengths().z - 5.0).abs() < 1e-5);
    }

    #[test]
    fn ter_forces_a_new_chain_and_end_stops_reading() {
        let structure = read(DIPEPTIDE);
        let ids: Vec<_> = structure.chains().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["A", "A", "B"]);
        assert!(structure.atoms().iter().all(|a| a.chain_id != "C"));
        assert_eq!(structure.residue_count(), 5);
        assert_eq!(structure.chains()[0].main_chain_residues(), &[1, 2]);
    }

    #[test]
    fn hetatm_records_are_flagged() {
        let structure = read(DIPEPTIDE);
        let zinc = structure.atom(10).unwrap();
        assert!(zinc.het_atom);
        assert_eq!(zinc.element, Element::Zn);
        assert_eq!(zinc.residue_type, StandardResidue::None);
    }

    #[test]
    fn long_titles_are_capped() {
        let mut text = String::new();
        for _ in 0..6 {
            text.push_str(&format!("TITLE     {}\n", "X".repeat(60)));
        }
        let structure = read(&text);
        assert_eq!(structure.title.chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn malformed_coordinates_abort_the_parse() {
        let line = "ATOM      1  N   ALA A   1      1x.104   6.134  -6.504  1.00  0.00           N\n";
        let err = PdbFile::read_from(&mut Cursor::new(line.as_bytes())).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Line {
                line: 1,
                kind: ParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn atom_names_are_aligned_by_element() {
        let mut ca = Atom::new(0, 1, "CA", Element::C, Point3::origin());
        assert_eq!(format_atom_name(&ca), " CA ");
        ca.name = "HD21".into();
        ca.element = Element::H;
        assert_eq!(format_atom_name(&ca), "HD21");
        let zn = Atom::new(1, 2, "ZN", Element::Zn, Point3::origin());
        assert_eq!(format_atom_name(&zn), "ZN  ");
    }

    #[test]
    fn round_trip_preserves_counts_and_elements() {
        let structure = read(DIPEPTIDE);
        let mut out = Vec::new();
        PdbFile::write_to(&structure, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("TITLE     SMALL TEST PEPTIDE\nCRYST1   30.000   40.000   50.000  90.00  90.00  90.00"));
        assert!(text.contains(
            "ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C"
        ));
        assert!(text.trim_end().ends_with("END"));

        let again = read(&text);
        assert_eq!(again.atom_count(), structure.atom_count());
        assert_eq!(again.residue_count(), structure.residue_count());
        assert_eq!(again.element_names(), structure.element_names());
        assert_eq!(again.chains().len(), structure.chains().len());
    }

    #[test]
    fn main_chain_selection_drops_hydrogens_and_heteroatoms() {
        let structure = read(DIPEPTIDE);
        let mut out = Vec::new();
        let options = PdbWriteOptions {
            selection: PdbAtomSelection::MainChainResidues,
        };
        PdbFile::write_with(&structure, None, &options, &mut out).unwrap();
        let again = read(std::str::from_utf8(&out).unwrap());
        assert_eq!(again.atom_count(), 8);
        assert!(again.atoms().iter().all(|a| !a.is_hydrogen() && !a.het_atom));
    }

    #[test]
    fn residue_numbers_wrap_without_merging_residues() {
        let mut builder = StructureBuilder::new("solvent");
        builder.start_chain("W");
        for n in 0..10_005 {
            builder.start_residue(n + 1, "SOL");
            builder.add_atom(n + 1, "OW", None, Point3::new(0.1, 0.2, 0.3), false);
        }
        let structure = builder.build();

        let mut out = Vec::new();
        PdbFile::write_to(&structure, None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let records: Vec<_> = text.lines().filter(|l| l.starts_with("HETATM")).collect();
        assert_eq!(records.len(), 10_005);
        assert!(records.iter().all(|l| l.len() == 78));
        assert_eq!(&records[9_998][22..26], "9999");
        assert_eq!(&records[9_999][22..26], "   0");
        assert_eq!(&records[10_000][22..26], "   1");
        assert_eq!(&records[9_999][30..38], "   1.000");

        let again = read(&text);
        assert_eq!(again.atom_count(), 10_005);
        assert_eq!(again.residue_count(), 10_005);
        assert!((again.atom(10_004).unwrap().position.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn frame_coordinates_are_written_in_angstrom() {
        let mut builder = StructureBuilder::new("frame");
        builder.start_chain("A");
        builder.start_residue(1, "GLY");
        builder.add_atom(1, "CA", None, Point3::origin(), false);
        let structure = builder.build();
        let frame = PrimaryStructureFrame::new(vec![0.1234, 0.5, -0.25]);
        let mut out = Vec::new();
        PdbFile::write_to(&structure, Some(&frame), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("   1.234   5.000  -2.500"));
    }
}
