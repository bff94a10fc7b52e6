use super::error::{ParseError, ParseErrorKind, parse_float};
use super::gro::{NumberedLines, parse_atom_count};
use super::traits::StructureFile;
use crate::core::models::builder::StructureBuilder;
use crate::core::models::structure::PrimaryStructure;
use nalgebra::Point3;
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

static ATOM_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    let float = r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)";
    Regex::new(&format!(r"^\s*(\S+)\s+{float}\s+{float}\s+{float}"))
        .expect("atom record pattern is valid")
});

/// Generic `name x y z` coordinate files. Atoms carry no residue or chain.
pub struct XyzFile;

impl StructureFile for XyzFile {
    fn read_from(reader: &mut impl BufRead) -> Result<PrimaryStructure, ParseError> {
        let mut lines = NumberedLines::new(reader);

        let count_line = lines.expect_line("atom count line")?.to_string();
        let atom_count = parse_atom_count(&count_line, lines.line_no())?;
        let title = lines.expect_line("title line")?.trim().to_string();

        let mut builder = StructureBuilder::new(&title);
        for ordinal in 0..atom_count {
            let line = lines.expect_line("atom record")?.to_string();
            let line_no = lines.line_no();
            let captures = ATOM_RECORD.captures(&line).ok_or_else(|| {
                ParseError::line(line_no, ParseErrorKind::InvalidRecord(line.clone()))
            })?;
            let field = |i: usize| captures.get(i).map_or("", |m| m.as_str());
            let position = Point3::new(
                parse_float(field(2), line_no, "x")?,
                parse_float(field(3), line_no, "y")?,
                parse_float(field(4), line_no, "z")?,
            );
            builder.add_atom(ordinal as i32 + 1, field(1), None, position, false);
        }
        Ok(builder.build())
    }
}
