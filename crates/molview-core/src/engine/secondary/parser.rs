use crate::core::io::error::slice_and_trim;
use crate::core::models::secondary::{
    SecondaryStructure, SecondaryStructureInfo, SecondaryStructureType,
};
use crate::engine::error::ClassificationError;

const ASSIGNMENT_PREFIX: &str = "ASG ";
const CODE_COLUMN: usize = 24;

fn invalid(line_no: usize, what: &str, value: &str) -> ClassificationError {
    ClassificationError::InvalidOutput(format!("line {line_no}: invalid {what} '{value}'"))
}

/// Parses the per-residue `ASG` records of the classifier's output.
///
/// Every other line is ignored. Unknown structure codes are read as coil. Output without a
/// single `ASG` record is rejected.
pub fn parse_classifier_output(output: &str) -> Result<SecondaryStructure, ClassificationError> {
    let mut structure = SecondaryStructure::new();
    let mut records = 0usize;

    for (line_idx, line) in output.lines().enumerate() {
        if !line.starts_with(ASSIGNMENT_PREFIX) {
            continue;
        }
        let line_no = line_idx + 1;
        records += 1;

        let residue = slice_and_trim(line, 10, 15);
        let residue_index: usize = residue
            .parse()
            .map_err(|_| invalid(line_no, "residue index", residue))?;
        let code = line
            .get(CODE_COLUMN..)
            .and_then(|rest| rest.chars().next())
            .ok_or_else(|| invalid(line_no, "structure code", ""))?;
        let phi = slice_and_trim(line, 42, 49);
        let psi = slice_and_trim(line, 52, 59);

        structure.insert(
            residue_index,
            SecondaryStructureInfo {
                structure_type: SecondaryStructureType::from_code(code),
                phi: phi.parse().map_err(|_| invalid(line_no, "phi angle", phi))?,
                psi: psi.parse().map_err(|_| invalid(line_no, "psi angle", psi))?,
            },
        );
    }

    if records == 0 {
        return Err(ClassificationError::InvalidOutput(
            "no residue assignment records".into(),
        ));
    }
    Ok(structure)
}
