use super::error::{ParseError, ParseErrorKind, parse_float, parse_int};
use crate::core::models::frame::PrimaryStructureTrajectory;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Per-atom scalar values loaded from a colour side-channel file.
///
/// The file is a free-form stream of whitespace-separated `<atom index> <value>` pairs with
/// 1-based atom indices. Each time index 1 recurs a new colour frame begins. Atoms not
/// mentioned in a frame keep the default value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColourFrames {
    frames: Vec<Vec<f32>>,
}

impl ColourFrames {
    pub fn read_from(
        reader: &mut impl BufRead,
        atom_count: usize,
        default: f32,
    ) -> Result<Self, ParseError> {
        let mut frames: Vec<Vec<f32>> = Vec::new();
        let mut pending_index: Option<(usize, usize)> = None;

        for (line_idx, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_no = line_idx + 1;
            for token in line.split_whitespace() {
                let Some((index, index_line)) = pending_index.take() else {
                    pending_index = Some((parse_int(token, line_no, "atom index")?, line_no));
                    continue;
                };
                let value = parse_float(token, line_no, "colour value")?;
                if index == 0 || index > atom_count {
                    return Err(ParseError::line(
                        index_line,
                        ParseErrorKind::InvalidRecord(format!(
                            "atom index {index} is outside 1..={atom_count}"
                        )),
                    ));
                }
                if index == 1 || frames.is_empty() {
                    frames.push(vec![default; atom_count]);
                }
                if let Some(frame) = frames.last_mut() {
                    frame[index - 1] = value;
                }
            }
        }

        if let Some((index, line)) = pending_index {
            return Err(ParseError::line(
                line,
                ParseErrorKind::UnexpectedEnd(format!("a value for atom {index}")),
            ));
        }
        debug!(frames = frames.len(), "Read colour frames");
        Ok(Self { frames })
    }

    pub fn read_from_path<P: AsRef<Path>>(
        path: P,
        atom_count: usize,
        default: f32,
    ) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let read = || -> Result<Self, ParseError> {
            let mut reader = BufReader::new(File::open(path)?);
            Self::read_from(&mut reader, atom_count, default)
        };
        read().map_err(|e| e.in_file(path))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        self.frames.get(index).map(Vec::as_slice)
    }

    /// Assigns colour frames to trajectory frames by position. Trajectory frames beyond the
    /// available colour frames receive a buffer filled with `default`.
    pub fn apply_to(&self, trajectory: &mut PrimaryStructureTrajectory, default: f32) {
        for (i, frame) in trajectory.frames_mut().iter_mut().enumerate() {
            let colours = match self.frames.get(i) {
                Some(colours) => colours.clone(),
                None => vec![default; frame.atom_count],
            };
            frame.colours = Some(colours);
        }
    }
}
