use super::error::ParseError;
use crate::core::models::frame::{PrimaryStructureFrame, PrimaryStructureTrajectory};
use crate::core::models::structure::PrimaryStructure;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Seek, Write};
use std::path::Path;

/// A file format that yields a single structural snapshot.
pub trait StructureFile {
    /// Reads a structure from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the input is malformed, truncated or unreadable.
    fn read_from(reader: &mut impl BufRead) -> Result<PrimaryStructure, ParseError>;

    /// Reads a structure from a file path.
    ///
    /// The file handle is scoped to this call and released on every exit path. Failures
    /// are wrapped in [`ParseError::File`] carrying the path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<PrimaryStructure, ParseError> {
        let path = path.as_ref();
        let read = || -> Result<PrimaryStructure, ParseError> {
            let file = File::open(path)?;
            let mut reader = BufReader::new(file);
            Self::read_from(&mut reader)
        };
        read().map_err(|e| e.in_file(path))
    }
}

/// A file format that a structure, optionally with one frame's coordinates, can be written to.
pub trait StructureWriter {
    /// Writes `structure` to `writer`. When `frame` is given, its coordinates replace the
    /// structure's reference positions.
    fn write_to(
        structure: &PrimaryStructure,
        frame: Option<&PrimaryStructureFrame>,
        writer: &mut impl Write,
    ) -> io::Result<()>;

    fn write_to_path<P: AsRef<Path>>(
        structure: &PrimaryStructure,
        frame: Option<&PrimaryStructureFrame>,
        path: P,
    ) -> io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, frame, &mut writer)?;
        writer.flush()
    }
}

/// Which frames of a trajectory to materialize.
///
/// `start` frames are skipped first, then frames are read until `count` is reached (or the
/// stream ends). After every read frame, `frequency - 1` frames are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSelection {
    pub start: usize,
    pub count: Option<usize>,
    pub frequency: usize,
}

impl Default for FrameSelection {
    fn default() -> Self {
        Self {
            start: 0,
            count: None,
            frequency: 1,
        }
    }
}

impl FrameSelection {
    pub fn all() -> Self {
        Self::default()
    }

    /// A frequency of zero is treated as one.
    pub fn new(start: usize, count: Option<usize>, frequency: usize) -> Self {
        Self {
            start,
            count,
            frequency: frequency.max(1),
        }
    }

    /// Drives `source` according to this selection and collects the read frames.
    pub fn collect_from(
        &self,
        source: &mut impl FrameSource,
    ) -> Result<PrimaryStructureTrajectory, ParseError> {
        let mut trajectory = PrimaryStructureTrajectory::new();
        for _ in 0..self.start {
            if !source.skip_frame()? {
                return Ok(trajectory);
            }
        }
        'frames: loop {
            if self.count.is_some_and(|c| trajectory.len() >= c) {
                break;
            }
            match source.next_frame()? {
                Some(frame) => trajectory.push(frame),
                None => break,
            }
            if self.count.is_some_and(|c| trajectory.len() >= c) {
                break;
            }
            for _ in 1..self.frequency.max(1) {
                if !source.skip_frame()? {
                    break 'frames;
                }
            }
        }
        Ok(trajectory)
    }
}

/// A positioned stream of trajectory frames.
///
/// Both methods report the end of the stream (including a truncated final frame) as
/// `Ok(false)` / `Ok(None)` rather than as an error.
pub trait FrameSource {
    /// Advances past one frame without materializing its coordinates.
    fn skip_frame(&mut self) -> Result<bool, ParseError>;

    /// Decodes the next frame.
    fn next_frame(&mut self) -> Result<Option<PrimaryStructureFrame>, ParseError>;
}

/// A file format that yields a sequence of frames.
pub trait TrajectoryFile {
    /// Reads the selected frames from a seekable reader.
    fn read_from<R: BufRead + Seek>(
        reader: &mut R,
        selection: &FrameSelection,
    ) -> Result<PrimaryStructureTrajectory, ParseError>;

    fn read_from_path<P: AsRef<Path>>(
        path: P,
        selection: &FrameSelection,
    ) -> Result<PrimaryStructureTrajectory, ParseError> {
        let path = path.as_ref();
        let read = || -> Result<PrimaryStructureTrajectory, ParseError> {
            let file = File::open(path)?;
            let mut reader = BufReader::new(file);
            Self::read_from(&mut reader, selection)
        };
        read().map_err(|e| e.in_file(path))
    }
}
