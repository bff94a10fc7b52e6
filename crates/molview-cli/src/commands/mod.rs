pub mod bonds;
pub mod convert;
pub mod info;
pub mod secondary;
pub mod trajectory;

use crate::error::{CliError, Result};
use molview::core::io::traits::FrameSelection;
use molview::core::models::frame::PrimaryStructureTrajectory;
use molview::workflows::load::load_trajectory;
use std::path::Path;

/// Reads frame `frame` of `path` as a one-frame trajectory and checks its atom count.
pub(crate) fn load_single_frame(
    path: &Path,
    frame: usize,
    atom_count: usize,
) -> Result<PrimaryStructureTrajectory> {
    let trajectory = load_trajectory(path, &FrameSelection::new(frame, Some(1), 1))?;
    match trajectory.frame(0) {
        None => Err(CliError::Argument(format!(
            "trajectory {} has no frame {frame}",
            path.display()
        ))),
        Some(f) if f.atom_count != atom_count => Err(CliError::Argument(format!(
            "frame {frame} has {} atoms but the structure has {atom_count}",
            f.atom_count
        ))),
        Some(_) => Ok(trajectory),
    }
}
