use super::error::{ParseError, ParseErrorKind, parse_float, parse_int, slice_and_trim};
use super::traits::{StructureFile, StructureWriter};
use crate::core::models::bounding_box::BoundingBox;
use crate::core::models::builder::{StructureBuilder, chain_letter};
use crate::core::models::frame::PrimaryStructureFrame;
use crate::core::models::structure::PrimaryStructure;
use crate::core::tables::elements::{Element, element_from_atom_name};
use crate::core::tables::residues::{StandardResidue, classify_residue};
use nalgebra::Point3;
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::LazyLock;
use tracing::debug;

static TITLE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"t=\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)").expect("time pattern is valid")
});

/// Extracts the simulation time embedded in a GRO title as `t= <float>`.
pub fn parse_title_time(title: &str) -> Option<f32> {
    TITLE_TIME
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroAtomRecord<'a> {
    pub residue_id: i32,
    pub residue_name: &'a str,
    pub atom_name: &'a str,
    pub serial: i32,
    pub position: Point3<f32>,
}

pub(crate) fn parse_atom_record(line: &str, line_no: usize) -> Result<GroAtomRecord<'_>, ParseError> {
    let residue_name = slice_and_trim(line, 5, 10);
    let atom_name = slice_and_trim(line, 10, 15);
    if atom_name.is_empty() {
        return Err(ParseError::line(
            line_no,
            ParseErrorKind::MissingRequiredField {
                columns: "10-15".into(),
            },
        ));
    }
    Ok(GroAtomRecord {
        residue_id: parse_int(slice_and_trim(line, 0, 5), line_no, "0-5")?,
        residue_name,
        atom_name,
        serial: parse_int(slice_and_trim(line, 15, 20), line_no, "15-20")?,
        position: parse_coordinates(line, line_no)?,
    })
}

pub(crate) fn parse_coordinates(line: &str, line_no: usize) -> Result<Point3<f32>, ParseError> {
    Ok(Point3::new(
        parse_float(slice_and_trim(line, 20, 28), line_no, "20-28")?,
        parse_float(slice_and_trim(line, 28, 36), line_no, "28-36")?,
        parse_float(slice_and_trim(line, 36, 44), line_no, "36-44")?,
    ))
}

/// Parses the trailing box line: 3 or 9 whitespace-separated floats.
pub(crate) fn parse_box_line(line: &str, line_no: usize) -> Result<BoundingBox, ParseError> {
    let values = line
        .split_whitespace()
        .map(|v| parse_float(v, line_no, "box"))
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() < 3 || values.len() > 9 {
        return Err(ParseError::line(
            line_no,
            ParseErrorKind::InvalidRecord(line.trim().to_string()),
        ));
    }
    Ok(BoundingBox::from_gro_values(&values))
}

/// Line reader that tracks 1-based line numbers and reports premature end of input.
pub(crate) struct NumberedLines<'r, R: BufRead> {
    reader: &'r mut R,
    line_no: usize,
    buffer: String,
}

impl<'r, R: BufRead> NumberedLines<'r, R> {
    pub fn new(reader: &'r mut R) -> Self {
        Self {
            reader,
            line_no: 0,
            buffer: String::new(),
        }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// The next line without its terminator, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<&str>, ParseError> {
        self.buffer.clear();
        if self.reader.read_line(&mut self.buffer)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buffer.trim_end_matches(['\n', '\r'])))
    }

    pub fn expect_line(&mut self, expected: &str) -> Result<&str, ParseError> {
        let line_no = self.line_no + 1;
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(ParseError::line(
                line_no,
                ParseErrorKind::UnexpectedEnd(expected.to_string()),
            )),
        }
    }
}

pub(crate) fn parse_atom_count(line: &str, line_no: usize) -> Result<usize, ParseError> {
    parse_int(line.trim(), line_no, "atom count")
}

pub struct GroFile;

impl StructureFile for GroFile {
    fn read_from(reader: &mut impl BufRead) -> Result<PrimaryStructure, ParseError> {
        let mut lines = NumberedLines::new(reader);

        let title = lines.expect_line("title line")?.trim().to_string();
        let mut builder = StructureBuilder::new(&title);
        builder.set_time(parse_title_time(&title));

        let count_line = lines.expect_line("atom count line")?.to_string();
        let atom_count = parse_atom_count(&count_line, lines.line_no())?;

        let mut current_residue_id: Option<i32> = None;
        let mut chain_type: Option<StandardResidue> = None;
        let mut residue_type = StandardResidue::None;
        let mut trailing_oxygens = 0usize;

        for _ in 0..atom_count {
            let line = lines.expect_line("atom record")?.to_string();
            let record = parse_atom_record(&line, lines.line_no())?;

            if current_residue_id != Some(record.residue_id) {
                let next_type = classify_residue(record.residue_name);
                let carboxyl_terminus =
                    residue_type == StandardResidue::AminoAcid && trailing_oxygens >= 2;
                if chain_type != Some(next_type) || carboxyl_terminus {
                    builder.start_chain(&chain_letter(builder.chain_count()));
                    chain_type = Some(next_type);
                }
                builder.start_residue(record.residue_id, record.residue_name);
                current_residue_id = Some(record.residue_id);
                residue_type = next_type;
                trailing_oxygens = 0;
            }

            let element = element_from_atom_name(record.atom_name, residue_type);
            builder.add_atom(
                record.serial,
                record.atom_name,
                Some(element),
                record.position,
                false,
            );
            if element == Element::O {
                trailing_oxygens += 1;
            } else {
                trailing_oxygens = 0;
            }
        }

        if let Some(line) = lines.next_line()? {
            if !line.trim().is_empty() {
                let line = line.to_string();
                builder.set_bounding_box(Some(parse_box_line(&line, lines.line_no())?));
            }
        }

        let structure = builder.build();
        debug!(
            atoms = structure.atom_count(),
            residues = structure.residue_count(),
            chains = structure.chains().len(),
            "Parsed GRO structure"
        );
        Ok(structure)
    }
}

fn truncate(value: &str, width: usize) -> &str {
    match value.char_indices().nth(width) {
        Some((i, _)) => &value[..i],
        None => value,
    }
}

impl StructureWriter for GroFile {
    fn write_to(
        structure: &PrimaryStructure,
        frame: Option<&PrimaryStructureFrame>,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let time = frame.and_then(|f| f.time).or(structure.time);
        match time {
            Some(t) if parse_title_time(&structure.title).is_none() => {
                writeln!(writer, "{} t= {:.5}", structure.title, t)?
            }
            _ => writeln!(writer, "{}", structure.title)?,
        }
        writeln!(writer, "{:>5}", structure.atom_count())?;

        for atom in structure.atoms() {
            let position = frame
                .and_then(|f| f.position(atom.index))
                .unwrap_or(atom.position);
            let residue_name = if atom.residue_name.is_empty() {
                "UNK"
            } else {
                truncate(&atom.residue_name, 5)
            };
            writeln!(
                writer,
                "{:>5}{:<5}{:>5}{:>5}{:>8.3}{:>8.3}{:>8.3}",
                atom.residue_id.rem_euclid(100_000),
                residue_name,
                truncate(&atom.name, 5),
                atom.id.rem_euclid(100_000),
                position.x,
                position.y,
                position.z
            )?;
        }

        let bounding_box = structure
            .bounding_box
            .or_else(|| BoundingBox::enclosing(structure.atoms().iter().map(|a| &a.position)))
            .unwrap_or_else(|| BoundingBox::rectangular(0.0, 0.0, 0.0));
        let values = bounding_box.to_gro_values();
        let values = if bounding_box.is_rectangular() {
            &values[..3]
        } else {
            &values[..]
        };
        let line: Vec<String> = values.iter().map(|v| format!("{:>10.5}", v)).collect();
        writeln!(writer, "{}", line.join(""))
    }
}
