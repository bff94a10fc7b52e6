//! Secondary-structure assignment through an external classifier.
//!
//! A structure (or one trajectory frame) is written to a temporary PDB file, the classifier
//! is run on it and its `ASG` records are parsed into a [`SecondaryStructure`]. The temporary
//! file is removed on every exit path.

mod classifier;
mod parser;
mod trajectory;

pub use classifier::{Classifier, StrideClassifier};
pub use parser::parse_classifier_output;
pub use trajectory::SecondaryStructureTrajectory;

use crate::core::io::pdb::{PdbAtomSelection, PdbFile, PdbWriteOptions};
use crate::core::models::frame::PrimaryStructureFrame;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::structure::PrimaryStructure;
use crate::engine::error::ClassificationError;
use std::io::{BufWriter, Write};
use tracing::{debug, instrument};

fn classify_snapshot<C: Classifier + ?Sized>(
    structure: &PrimaryStructure,
    frame: Option<&PrimaryStructureFrame>,
    selection: PdbAtomSelection,
    file_prefix: &str,
    classifier: &C,
) -> Result<SecondaryStructure, ClassificationError> {
    let mut file = tempfile::Builder::new()
        .prefix(file_prefix)
        .suffix(".pdb")
        .tempfile()?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        PdbFile::write_with(structure, frame, &PdbWriteOptions { selection }, &mut writer)?;
        writer.flush()?;
    }
    // Closes the handle; the path is still removed when dropped.
    let path = file.into_temp_path();
    debug!(path = %path.display(), "Wrote classifier input.");

    let output = classifier.classify(&path)?;
    parse_classifier_output(&output)
}

impl SecondaryStructure {
    /// Assigns secondary structure to every residue of `structure` using its reference
    /// coordinates. All atoms are written to the classifier input.
    #[instrument(skip_all, name = "secondary_structure")]
    pub fn generate<C: Classifier + ?Sized>(
        structure: &PrimaryStructure,
        classifier: &C,
    ) -> Result<Self, ClassificationError> {
        classify_snapshot(
            structure,
            None,
            PdbAtomSelection::All,
            "molview-structure-",
            classifier,
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::core::models::builder::StructureBuilder;
    use nalgebra::Point3;
    use std::cell::{Cell, RefCell};
    use std::path::{Path, PathBuf};

    pub const HELIX_LINE: &str =
        "ASG  ALA A    1    1    H    AlphaHelix    -57.00    -47.00      12.3      ~~~~";

    /// Records every invocation and the input it saw.
    #[derive(Default)]
    pub struct RecordingClassifier {
        pub fail: bool,
        pub calls: Cell<usize>,
        pub inputs: RefCell<Vec<(PathBuf, String)>>,
    }

    impl Classifier for RecordingClassifier {
        fn classify(&self, pdb_path: &Path) -> Result<String, ClassificationError> {
            self.calls.set(self.calls.get() + 1);
            let content = std::fs::read_to_string(pdb_path)?;
            self.inputs
                .borrow_mut()
                .push((pdb_path.to_path_buf(), content));
            if self.fail {
                Err(ClassificationError::Failed("segmentation fault".into()))
            } else {
                Ok(format!("REM  fake\n{HELIX_LINE}\n"))
            }
        }
    }

    /// One alanine with a hydrogen plus a water molecule.
    pub fn alanine_and_water() -> PrimaryStructure {
        let mut builder = StructureBuilder::new("ALA in water");
        builder.start_chain("A");
        builder.start_residue(1, "ALA");
        for (i, name) in ["N", "H", "CA", "C", "O", "CB"].iter().enumerate() {
            builder.add_atom(i as i32 + 1, name, None, Point3::new(0.1 * i as f32, 0.0, 0.0), false);
        }
        builder.end_chain();
        builder.start_chain("B");
        builder.start_residue(2, "SOL");
        builder.add_atom(7, "OW", None, Point3::new(1.0, 1.0, 1.0), false);
        builder.end_chain();
        builder.build()
    }
}
