use super::error::ParseError;
use super::gro::{NumberedLines, parse_atom_count, parse_coordinates, parse_title_time};
use super::traits::{FrameSelection, FrameSource, TrajectoryFile};
use crate::core::models::frame::{PrimaryStructureFrame, PrimaryStructureTrajectory};
use std::io::{BufRead, Seek};
use tracing::{debug, warn};

/// Multi-frame GRO-layout trajectories: only the per-frame coordinates and the optional
/// `t=` time in each title are kept.
pub struct PositionsFile;

struct PositionsFrames<'r, R: BufRead> {
    lines: NumberedLines<'r, R>,
    finished: bool,
}

impl<R: BufRead> PositionsFrames<'_, R> {
    /// Reads the title and count lines. `None` at a clean end of input.
    fn read_preamble(&mut self) -> Result<Option<(Option<f32>, usize)>, ParseError> {
        let time = match self.lines.next_line()? {
            None => return Ok(None),
            Some(title) if title.trim().is_empty() => return Ok(None),
            Some(title) => parse_title_time(title),
        };
        let count_line = self.lines.expect_line("atom count line")?.to_string();
        let atom_count = parse_atom_count(&count_line, self.lines.line_no())?;
        Ok(Some((time, atom_count)))
    }

    fn read_frame(&mut self) -> Result<Option<PrimaryStructureFrame>, ParseError> {
        let Some((time, atom_count)) = self.read_preamble()? else {
            return Ok(None);
        };
        let mut coords = Vec::with_capacity(atom_count * 3);
        for _ in 0..atom_count {
            let line = self.lines.expect_line("atom record")?.to_string();
            let position = parse_coordinates(&line, self.lines.line_no())?;
            coords.extend_from_slice(&[position.x, position.y, position.z]);
        }
        self.lines.expect_line("box line")?;

        let frame = PrimaryStructureFrame::new(coords);
        Ok(Some(match time {
            Some(t) => frame.with_time(t),
            None => frame,
        }))
    }

    fn skip(&mut self) -> Result<bool, ParseError> {
        let Some((_, atom_count)) = self.read_preamble()? else {
            return Ok(false);
        };
        for _ in 0..=atom_count {
            self.lines.expect_line("atom record")?;
        }
        Ok(true)
    }

    /// Ends the trajectory on a truncated or malformed frame. Errors from the underlying
    /// reader are still reported.
    fn recover<T>(&mut self, result: Result<T, ParseError>, end: T) -> Result<T, ParseError> {
        match result {
            Err(ParseError::Io(e)) if e.kind() != std::io::ErrorKind::UnexpectedEof => {
                Err(ParseError::Io(e))
            }
            Err(e) => {
                warn!(line = self.lines.line_no(), "Dropping malformed trailing frame: {e}");
                self.finished = true;
                Ok(end)
            }
            ok => ok,
        }
    }
}

impl<R: BufRead> FrameSource for PositionsFrames<'_, R> {
    fn skip_frame(&mut self) -> Result<bool, ParseError> {
        if self.finished {
            return Ok(false);
        }
        let result = self.skip();
        self.recover(result, false)
    }

    fn next_frame(&mut self) -> Result<Option<PrimaryStructureFrame>, ParseError> {
        if self.finished {
            return Ok(None);
        }
        let result = self.read_frame();
        self.recover(result, None)
    }
}

impl TrajectoryFile for PositionsFile {
    fn read_from<R: BufRead + Seek>(
        reader: &mut R,
        selection: &FrameSelection,
    ) -> Result<PrimaryStructureTrajectory, ParseError> {
        let mut frames = PositionsFrames {
            lines: NumberedLines::new(reader),
            finished: false,
        };
        let trajectory = selection.collect_from(&mut frames)?;
        debug!(frames = trajectory.len(), "Read positions trajectory");
        Ok(trajectory)
    }
}
