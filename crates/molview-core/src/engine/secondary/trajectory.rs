use super::{Classifier, classify_snapshot};
use crate::core::io::pdb::PdbAtomSelection;
use crate::core::models::frame::PrimaryStructureTrajectory;
use crate::core::models::secondary::SecondaryStructure;
use crate::core::models::structure::PrimaryStructure;
use crate::engine::error::ClassificationError;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, warn};

/// Lazily classified secondary structure for every frame of a trajectory.
///
/// Each frame is classified at most once. Successful results are cached, and frames whose
/// classification failed are remembered so later requests fail without rerunning the
/// classifier. Only main-chain residues are sent to the classifier, without heteroatoms and
/// hydrogens.
pub struct SecondaryStructureTrajectory<'a, C> {
    structure: &'a PrimaryStructure,
    trajectory: &'a PrimaryStructureTrajectory,
    classifier: C,
    cache: BTreeMap<usize, SecondaryStructure>,
    bad_frames: BTreeSet<usize>,
}

impl<'a, C: Classifier> SecondaryStructureTrajectory<'a, C> {
    pub fn new(
        structure: &'a PrimaryStructure,
        trajectory: &'a PrimaryStructureTrajectory,
        classifier: C,
    ) -> Self {
        Self {
            structure,
            trajectory,
            classifier,
            cache: BTreeMap::new(),
            bad_frames: BTreeSet::new(),
        }
    }

    /// Secondary structure of frame `frame`, classifying it on first request.
    #[instrument(skip(self), name = "secondary_structure_frame")]
    pub fn frame(&mut self, frame: usize) -> Result<&SecondaryStructure, ClassificationError> {
        let slot = match self.cache.entry(frame) {
            Entry::Occupied(cached) => return Ok(cached.into_mut()),
            Entry::Vacant(slot) => slot,
        };
        if self.bad_frames.contains(&frame) {
            return Err(ClassificationError::PreviouslyFailed { frame });
        }
        let Some(data) = self.trajectory.frame(frame) else {
            return Err(ClassificationError::FrameOutOfRange {
                frame,
                len: self.trajectory.len(),
            });
        };

        let prefix = format!("molview-frame{frame}-");
        match classify_snapshot(
            self.structure,
            Some(data),
            PdbAtomSelection::MainChainResidues,
            &prefix,
            &self.classifier,
        ) {
            Ok(result) => {
                debug!(residues = result.len(), "Classified frame.");
                Ok(slot.insert(result))
            }
            Err(e) => {
                warn!(error = %e, "Frame classification failed; it will not be retried.");
                self.bad_frames.insert(frame);
                Err(e)
            }
        }
    }

    pub fn is_bad_frame(&self, frame: usize) -> bool {
        self.bad_frames.contains(&frame)
    }

    pub fn bad_frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.bad_frames.iter().copied()
    }

    pub fn cached(&self, frame: usize) -> Option<&SecondaryStructure> {
        self.cache.get(&frame)
    }

    pub fn cached_frame_count(&self) -> usize {
        self.cache.len()
    }

    pub fn frame_count(&self) -> usize {
        self.trajectory.len()
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::core::models::frame::PrimaryStructureFrame;

    fn trajectory(frames: usize, atoms: usize) -> PrimaryStructureTrajectory {
        (0..frames)
            .map(|i| PrimaryStructureFrame::new(vec![i as f32; atoms * 3]).with_step(i as i32))
            .collect()
    }

    #[test]
    fn repeated_requests_run_the_classifier_once() {
        let structure = alanine_and_water();
        let frames = trajectory(3, structure.atom_count());
        let mut pipeline =
            SecondaryStructureTrajectory::new(&structure, &frames, RecordingClassifier::default());

        assert_eq!(pipeline.frame(1).unwrap().len(), 1);
        assert_eq!(pipeline.frame(1).unwrap().len(), 1);
        pipeline.frame(2).unwrap();

        let classifier = pipeline.classifier();
        assert_eq!(classifier.calls.get(), 2);
        let inputs = classifier.inputs.borrow();
        assert!(inputs[0].0.to_string_lossy().contains("molview-frame1-"));
        assert!(inputs[1].0.to_string_lossy().contains("molview-frame2-"));
    }

    #[test]
    fn frame_input_holds_main_chain_atoms_at_frame_coordinates() {
        let structure = alanine_and_water();
        let frames = trajectory(2, structure.atom_count());
        let mut pipeline =
            SecondaryStructureTrajectory::new(&structure, &frames, RecordingClassifier::default());
        pipeline.frame(1).unwrap();

        let inputs = pipeline.classifier().inputs.borrow();
        let records: Vec<&str> = inputs[0]
            .1
            .lines()
            .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM"))
            .collect();
        // N, CA, C, O and CB; the hydrogen and the water are left out.
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|l| &l[30..38] == "  10.000"));
    }

    #[test]
    fn failed_frames_are_not_retried() {
        let structure = alanine_and_water();
        let frames = trajectory(2, structure.atom_count());
        let classifier = RecordingClassifier {
            fail: true,
            ..Default::default()
        };
        let mut pipeline = SecondaryStructureTrajectory::new(&structure, &frames, &classifier);

        assert!(matches!(pipeline.frame(0), Err(ClassificationError::Failed(_))));
        assert!(matches!(
            pipeline.frame(0),
            Err(ClassificationError::PreviouslyFailed { frame: 0 })
        ));
        assert!(pipeline.is_bad_frame(0));
        assert_eq!(classifier.calls.get(), 1);
    }

    #[test]
    fn out_of_range_frames_are_not_memoized() {
        let structure = alanine_and_water();
        let frames = trajectory(1, structure.atom_count());
        let mut pipeline =
            SecondaryStructureTrajectory::new(&structure, &frames, RecordingClassifier::default());
        assert!(matches!(
            pipeline.frame(5),
            Err(ClassificationError::FrameOutOfRange { frame: 5, len: 1 })
        ));
        assert!(!pipeline.is_bad_frame(5));
        assert_eq!(pipeline.classifier().calls.get(), 0);
    }
}
