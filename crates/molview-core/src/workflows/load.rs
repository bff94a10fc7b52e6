use crate::core::io::colour::ColourFrames;
use crate::core::io::dcd::DcdFile;
use crate::core::io::error::ParseError;
use crate::core::io::gro::GroFile;
use crate::core::io::pdb::PdbFile;
use crate::core::io::positions::PositionsFile;
use crate::core::io::traits::{FrameSelection, StructureFile, StructureWriter, TrajectoryFile};
use crate::core::io::xtc::XtcFile;
use crate::core::io::xyz::XyzFile;
use crate::core::models::frame::{PrimaryStructureFrame, PrimaryStructureTrajectory};
use crate::core::models::structure::PrimaryStructure;
use crate::engine::progress::{Progress, ProgressReporter};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn unsupported(path: &Path, kind: &str) -> ParseError {
    ParseError::UnsupportedFormat(format!(
        "'{}' is not a recognized {kind} file",
        path.display()
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureFormat {
    Gro,
    Pdb,
    Xyz,
}

impl StructureFormat {
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        match extension_of(path).as_str() {
            "gro" => Ok(Self::Gro),
            "pdb" | "ent" => Ok(Self::Pdb),
            "xyz" => Ok(Self::Xyz),
            _ => Err(unsupported(path, "structure")),
        }
    }

    /// Whether structures can be written in this format.
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Gro | Self::Pdb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrajectoryFormat {
    Dcd,
    Xtc,
    /// Multi-frame GRO layout.
    Positions,
}

impl TrajectoryFormat {
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        match extension_of(path).as_str() {
            "dcd" => Ok(Self::Dcd),
            "xtc" => Ok(Self::Xtc),
            "gro" | "pos" => Ok(Self::Positions),
            _ => Err(unsupported(path, "trajectory")),
        }
    }
}

pub fn load_structure(path: &Path) -> Result<PrimaryStructure, ParseError> {
    match StructureFormat::from_path(path)? {
        StructureFormat::Gro => GroFile::read_from_path(path),
        StructureFormat::Pdb => PdbFile::read_from_path(path),
        StructureFormat::Xyz => XyzFile::read_from_path(path),
    }
}

pub fn load_trajectory(
    path: &Path,
    selection: &FrameSelection,
) -> Result<PrimaryStructureTrajectory, ParseError> {
    match TrajectoryFormat::from_path(path)? {
        TrajectoryFormat::Dcd => DcdFile::read_from_path(path, selection),
        TrajectoryFormat::Xtc => XtcFile::read_from_path(path, selection),
        TrajectoryFormat::Positions => PositionsFile::read_from_path(path, selection),
    }
}

/// Writes `structure` (with `frame`'s coordinates when given) in the format implied by the
/// extension of `path`.
pub fn save_structure(
    structure: &PrimaryStructure,
    frame: Option<&PrimaryStructureFrame>,
    path: &Path,
) -> Result<(), LoadError> {
    let write = match StructureFormat::from_path(path)? {
        StructureFormat::Gro => GroFile::write_to_path(structure, frame, path),
        StructureFormat::Pdb => PdbFile::write_to_path(structure, frame, path),
        StructureFormat::Xyz => return Err(LoadError::ReadOnlyFormat(path.to_path_buf())),
    };
    write.map_err(|source| LoadError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "Trajectory frame {frame} has {found} atoms but the structure has {expected}"
    )]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    #[error("Structures cannot be written as '{0}'")]
    ReadOnlyFormat(PathBuf),

    #[error("Failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Everything besides the structure file that [`load`] should read.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub trajectory: Option<PathBuf>,
    pub colours: Option<PathBuf>,
    pub selection: FrameSelection,
    /// Value for atoms and frames without an entry in the colour file.
    pub colour_default: f32,
}

#[derive(Debug, Clone)]
pub struct LoadedSystem {
    pub structure: PrimaryStructure,
    pub trajectory: Option<PrimaryStructureTrajectory>,
}

/// Loads a structure and, optionally, a trajectory and a colour file for it.
///
/// Every trajectory frame must have as many atoms as the structure. Colours without a
/// trajectory are attached to a single frame holding the structure's own coordinates.
#[instrument(skip_all, name = "load_workflow", fields(structure = %structure_path.display()))]
pub fn load(
    structure_path: &Path,
    options: &LoadOptions,
    reporter: &ProgressReporter,
) -> Result<LoadedSystem, LoadError> {
    let structure = reporter.phase("Reading structure", || load_structure(structure_path))?;
    info!(
        atoms = structure.atom_count(),
        residues = structure.residue_count(),
        chains = structure.chains().len(),
        "Structure loaded."
    );

    let mut trajectory = match &options.trajectory {
        Some(path) => {
            let trajectory =
                reporter.phase("Reading trajectory", || load_trajectory(path, &options.selection))?;
            check_atom_counts(&structure, &trajectory)?;
            info!(frames = trajectory.len(), "Trajectory loaded.");
            reporter.report(Progress::Message(format!(
                "{} trajectory frame(s) loaded",
                trajectory.len()
            )));
            Some(trajectory)
        }
        None => None,
    };

    if let Some(path) = &options.colours {
        let colours = reporter.phase("Reading colours", || {
            ColourFrames::read_from_path(path, structure.atom_count(), options.colour_default)
        })?;
        let target = trajectory.get_or_insert_with(|| {
            std::iter::once(PrimaryStructureFrame::new(structure.coordinates())).collect()
        });
        colours.apply_to(target, options.colour_default);
        info!(colour_frames = colours.len(), "Colours applied.");
        reporter.report(Progress::Message(format!(
            "{} colour frame(s) applied to {} trajectory frame(s)",
            colours.len(),
            target.len()
        )));
    }

    Ok(LoadedSystem {
        structure,
        trajectory,
    })
}

fn check_atom_counts(
    structure: &PrimaryStructure,
    trajectory: &PrimaryStructureTrajectory,
) -> Result<(), LoadError> {
    let expected = structure.atom_count();
    match trajectory
        .frames()
        .iter()
        .position(|f| f.atom_count != expected)
    {
        Some(frame) => Err(LoadError::AtomCountMismatch {
            frame,
            expected,
            found: trajectory.frames()[frame].atom_count,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const WATER_GRO: &str = "Water t= 1.5\n    3\n    1SOL     OW    1   0.126   2.345   0.001\n    1SOL    HW1    2   0.190   2.420   0.001\n    1SOL    HW2    3   0.050   2.400   0.001\n   3.00000   3.00000   3.00000\n";

    fn positions(frames: usize, atoms: usize) -> String {
        let mut text = String::new();
        for f in 0..frames {
            text.push_str(&format!("frame t= {f}.0\n{atoms:>5}\n"));
            for a in 0..atoms {
                text.push_str(&format!(
                    "    1SOL     OW{:>5}{:>8.3}{:>8.3}{:>8.3}\n",
                    a + 1,
                    f as f32,
                    0.0,
                    0.0
                ));
            }
            text.push_str("   3.00000   3.00000   3.00000\n");
        }
        text
    }

    #[test]
    fn formats_are_detected_by_extension() {
        assert_eq!(
            StructureFormat::from_path(Path::new("a/b.PDB")).unwrap(),
            StructureFormat::Pdb
        );
        assert_eq!(
            TrajectoryFormat::from_path(Path::new("run.xtc")).unwrap(),
            TrajectoryFormat::Xtc
        );
        assert!(matches!(
            StructureFormat::from_path(Path::new("notes.txt")),
            Err(ParseError::UnsupportedFormat(_))
        ));
        assert!(!StructureFormat::Xyz.is_writable());
    }

    #[test]
    fn structure_trajectory_and_colours_load_together() {
        let dir = TempDir::new().unwrap();
        let gro = dir.path().join("water.gro");
        let traj = dir.path().join("water.pos");
        let colours = dir.path().join("water.col");
        fs::write(&gro, WATER_GRO).unwrap();
        fs::write(&traj, positions(3, 3)).unwrap();
        fs::write(&colours, "1 0.5 2 0.7 3 0.9\n").unwrap();

        let options = LoadOptions {
            trajectory: Some(traj),
            colours: Some(colours),
            selection: FrameSelection::all(),
            colour_default: -1.0,
        };
        let loaded = load(&gro, &options, &ProgressReporter::new()).unwrap();
        assert_eq!(loaded.structure.atom_count(), 3);
        let trajectory = loaded.trajectory.unwrap();
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.frame(0).unwrap().colour(2), Some(0.9));
        assert_eq!(trajectory.frame(2).unwrap().colour(0), Some(-1.0));
    }

    #[test]
    fn loading_reports_phases_and_summaries() {
        let dir = TempDir::new().unwrap();
        let gro = dir.path().join("water.gro");
        let traj = dir.path().join("water.pos");
        let colours = dir.path().join("water.col");
        fs::write(&gro, WATER_GRO).unwrap();
        fs::write(&traj, positions(2, 3)).unwrap();
        fs::write(&colours, "1 0.5\n").unwrap();

        let events = std::sync::Mutex::new(Vec::new());
        let reporter =
            ProgressReporter::with_callback(Box::new(|e| events.lock().unwrap().push(e)));
        let options = LoadOptions {
            trajectory: Some(traj),
            colours: Some(colours),
            ..Default::default()
        };
        load(&gro, &options, &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        let messages: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Progress::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            messages,
            [
                "2 trajectory frame(s) loaded",
                "1 colour frame(s) applied to 2 trajectory frame(s)"
            ]
        );
        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Progress::PhaseStart { name } => Some(*name),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            ["Reading structure", "Reading trajectory", "Reading colours"]
        );
    }

    #[test]
    fn mismatched_trajectory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let gro = dir.path().join("water.gro");
        let traj = dir.path().join("water.pos");
        fs::write(&gro, WATER_GRO).unwrap();
        fs::write(&traj, positions(1, 4)).unwrap();

        let options = LoadOptions {
            trajectory: Some(traj),
            ..Default::default()
        };
        let err = load(&gro, &options, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::AtomCountMismatch {
                frame: 0,
                expected: 3,
                found: 4
            }
        ));
    }

    #[test]
    fn colours_without_trajectory_use_the_structure_frame() {
        let dir = TempDir::new().unwrap();
        let gro = dir.path().join("water.gro");
        let colours = dir.path().join("water.col");
        fs::write(&gro, WATER_GRO).unwrap();
        fs::write(&colours, "1 2.0\n").unwrap();

        let options = LoadOptions {
            colours: Some(colours),
            ..Default::default()
        };
        let loaded = load(&gro, &options, &ProgressReporter::new()).unwrap();
        let frame = loaded.trajectory.unwrap().frame(0).cloned().unwrap();
        assert_eq!(frame.colour(0), Some(2.0));
        assert_eq!(frame.position(0).unwrap().x, 0.126);
    }

    #[test]
    fn structures_are_saved_by_extension() {
        let dir = TempDir::new().unwrap();
        let gro = dir.path().join("water.gro");
        fs::write(&gro, WATER_GRO).unwrap();
        let structure = load_structure(&gro).unwrap();

        let pdb = dir.path().join("water.pdb");
        save_structure(&structure, None, &pdb).unwrap();
        assert_eq!(load_structure(&pdb).unwrap().atom_count(), 3);
        assert!(matches!(
            save_structure(&structure, None, &dir.path().join("water.xyz")),
            Err(LoadError::ReadOnlyFormat(_))
        ));
    }
}
