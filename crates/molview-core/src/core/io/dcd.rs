//! CHARMM/NAMD DCD trajectories.
//!
//! The file is a sequence of little-endian Fortran unformatted records, each framed by
//! its byte length before and after the payload. The header is followed by one record
//! group per frame: an optional unit-cell record and the x, y, z coordinate records.

use super::error::ParseError;
use super::traits::{FrameSelection, FrameSource, TrajectoryFile};
use crate::core::models::bounding_box::BoundingBox;
use crate::core::models::frame::{PrimaryStructureFrame, PrimaryStructureTrajectory};
use std::io::{self, BufRead, Read, Seek, SeekFrom, Write};
use tracing::{debug, instrument};

const MAGIC: &[u8; 4] = b"CORD";
const HEADER_RECORD_LEN: usize = 84;
const TITLE_LINE_LEN: usize = 80;
const UNIT_CELL_RECORD_LEN: u64 = 48;
const RECORD_MARKERS_LEN: u64 = 8;
const CHARMM_VERSION: i32 = 24;

/// Decoded DCD header.
#[derive(Debug, Clone, PartialEq)]
pub struct DcdHeader {
    pub frame_count: usize,
    pub start_step: i32,
    pub save_interval: i32,
    pub atom_count: usize,
    pub has_unit_cell: bool,
    pub title: Vec<String>,
}

impl DcdHeader {
    /// Byte length of one frame on disk, including record markers.
    pub fn frame_bytes(&self) -> u64 {
        let coordinates = ((self.atom_count as u64 * 3) + 6) * 4;
        if self.has_unit_cell {
            coordinates + UNIT_CELL_RECORD_LEN + RECORD_MARKERS_LEN
        } else {
            coordinates
        }
    }

    pub fn step_of(&self, ordinal: usize) -> i32 {
        self.start_step
            .saturating_add((ordinal as i32).saturating_mul(self.save_interval.max(1)))
    }
}

fn read_i32(reader: &mut impl Read) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn le_i32(bytes: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(buf)
}

fn read_record(reader: &mut impl Read) -> Result<Vec<u8>, ParseError> {
    let len = read_i32(reader)?;
    if len < 0 {
        return Err(ParseError::Binary(format!("negative record length {len}")));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    let trailer = read_i32(reader)?;
    if trailer != len {
        return Err(ParseError::Binary(format!(
            "record length markers disagree ({len} vs {trailer})"
        )));
    }
    Ok(payload)
}

fn read_coordinate_record(
    reader: &mut impl Read,
    atom_count: usize,
    axis: usize,
    coords: &mut [f32],
) -> Result<(), ParseError> {
    let payload = read_record(reader)?;
    if payload.len() != atom_count * 4 {
        return Err(ParseError::Binary(format!(
            "coordinate record holds {} bytes, expected {}",
            payload.len(),
            atom_count * 4
        )));
    }
    for (i, chunk) in payload.chunks_exact(4).enumerate() {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        coords[i * 3 + axis] = (value / 10.0 * 1000.0).round() / 1000.0;
    }
    Ok(())
}

pub struct DcdFile;

impl DcdFile {
    /// Reads the header, title and atom-count records.
    pub fn read_header(reader: &mut impl Read) -> Result<DcdHeader, ParseError> {
        let header = read_record(reader)?;
        if header.len() != HEADER_RECORD_LEN || &header[..4] != MAGIC {
            return Err(ParseError::UnsupportedFormat(
                "missing DCD 'CORD' header record".into(),
            ));
        }
        let icntrl = |i: usize| le_i32(&header, 4 + i * 4);
        let fixed_atoms = icntrl(8);
        if fixed_atoms != 0 {
            return Err(ParseError::Binary(format!(
                "{fixed_atoms} fixed atoms declared; fixed-atom trajectories are not supported"
            )));
        }

        let title_record = read_record(reader)?;
        let title = if title_record.len() >= 4 {
            let lines = le_i32(&title_record, 0).max(0) as usize;
            title_record[4..]
                .chunks(TITLE_LINE_LEN)
                .take(lines)
                .map(|line| String::from_utf8_lossy(line).trim_end_matches(['\0', ' ']).to_string())
                .collect()
        } else {
            Vec::new()
        };

        let atoms_record = read_record(reader)?;
        if atoms_record.len() != 4 {
            return Err(ParseError::Binary("malformed atom count record".into()));
        }
        let atom_count = le_i32(&atoms_record, 0);
        if atom_count < 0 {
            return Err(ParseError::Binary(format!("negative atom count {atom_count}")));
        }

        Ok(DcdHeader {
            frame_count: icntrl(0).max(0) as usize,
            start_step: icntrl(1),
            save_interval: icntrl(2),
            atom_count: atom_count as usize,
            has_unit_cell: icntrl(10) != 0,
            title,
        })
    }

    /// Writes a trajectory as a DCD file, coordinates converted to Ångström.
    ///
    /// When `unit_cell` is given every frame carries a unit-cell record.
    pub fn write_to(
        trajectory: &PrimaryStructureTrajectory,
        start_step: i32,
        save_interval: i32,
        unit_cell: Option<&BoundingBox>,
        writer: &mut impl Write,
    ) -> io::Result<()> {
        let atom_count = trajectory.atom_count();

        let mut header = Vec::with_capacity(HEADER_RECORD_LEN);
        header.extend_from_slice(MAGIC);
        let mut icntrl = [0i32; 20];
        icntrl[0] = trajectory.len() as i32;
        icntrl[1] = start_step;
        icntrl[2] = save_interval;
        icntrl[10] = i32::from(unit_cell.is_some());
        icntrl[19] = CHARMM_VERSION;
        for value in icntrl {
            header.extend_from_slice(&value.to_le_bytes());
        }
        write_record(writer, &header)?;

        let mut title = Vec::with_capacity(4 + TITLE_LINE_LEN);
        title.extend_from_slice(&1i32.to_le_bytes());
        let mut line = b"molview trajectory".to_vec();
        line.resize(TITLE_LINE_LEN, b' ');
        title.extend_from_slice(&line);
        write_record(writer, &title)?;

        write_record(writer, &(atom_count as i32).to_le_bytes())?;

        for frame in trajectory.frames() {
            if let Some(cell) = unit_cell {
                let lengths = cell.lengths() * 10.0;
                let angles = cell.angles();
                let mut record = Vec::with_capacity(UNIT_CELL_RECORD_LEN as usize);
                for value in [lengths.x, angles.z, lengths.y, angles.y, angles.x, lengths.z] {
                    record.extend_from_slice(&f64::from(value).to_le_bytes());
                }
                write_record(writer, &record)?;
            }
            for axis in 0..3 {
                let record: Vec<u8> = (0..atom_count)
                    .flat_map(|i| {
                        let value = frame.coords.get(i * 3 + axis).copied().unwrap_or(0.0);
                        (value * 10.0).to_le_bytes()
                    })
                    .collect();
                write_record(writer, &record)?;
            }
        }
        Ok(())
    }
}

fn write_record(writer: &mut impl Write, payload: &[u8]) -> io::Result<()> {
    let len = (payload.len() as i32).to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(payload)?;
    writer.write_all(&len)
}

/// Frame cursor positioned just after the header records.
struct DcdFrames<'r, R> {
    reader: &'r mut R,
    header: DcdHeader,
    ordinal: usize,
    data_end: u64,
}

impl<R: Read + Seek> DcdFrames<'_, R> {
    fn read_frame(&mut self) -> Result<PrimaryStructureFrame, ParseError> {
        if self.header.has_unit_cell {
            read_record(&mut *self.reader)?;
        }
        let atom_count = self.header.atom_count;
        let mut coords = vec![0.0f32; atom_count * 3];
        for axis in 0..3 {
            read_coordinate_record(&mut *self.reader, atom_count, axis, &mut coords)?;
        }
        Ok(PrimaryStructureFrame::new(coords).with_step(self.header.step_of(self.ordinal)))
    }
}

impl<R: Read + Seek> FrameSource for DcdFrames<'_, R> {
    fn skip_frame(&mut self) -> Result<bool, ParseError> {
        let position = self.reader.stream_position()?;
        let frame_bytes = self.header.frame_bytes();
        if position + frame_bytes > self.data_end {
            return Ok(false);
        }
        self.reader.seek(SeekFrom::Current(frame_bytes as i64))?;
        self.ordinal += 1;
        Ok(true)
    }

    fn next_frame(&mut self) -> Result<Option<PrimaryStructureFrame>, ParseError> {
        match self.read_frame() {
            Ok(frame) => {
                self.ordinal += 1;
                Ok(Some(frame))
            }
            Err(e) if e.is_end_of_stream() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl TrajectoryFile for DcdFile {
    #[instrument(skip_all, name = "dcd_read")]
    fn read_from<R: BufRead + Seek>(
        reader: &mut R,
        selection: &FrameSelection,
    ) -> Result<PrimaryStructureTrajectory, ParseError> {
        let header = Self::read_header(reader)?;
        let data_start = reader.stream_position()?;
        let data_end = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(data_start))?;

        debug!(
            atoms = header.atom_count,
            declared_frames = header.frame_count,
            unit_cell = header.has_unit_cell,
            "Read DCD header"
        );

        let mut frames = DcdFrames {
            reader,
            header,
            ordinal: 0,
            data_end,
        };
        selection.collect_from(&mut frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn trajectory(atoms: usize, frames: usize) -> PrimaryStructureTrajectory {
        (0..frames)
            .map(|f| {
                let coords = (0..atoms * 3)
                    .map(|i| (f * 1000 + i) as f32 * 0.001)
                    .collect();
                PrimaryStructureFrame::new(coords)
            })
            .collect()
    }

    fn encode(
        trajectory: &PrimaryStructureTrajectory,
        unit_cell: Option<&BoundingBox>,
    ) -> Vec<u8> {
        let mut bytes = Vec::new();
        DcdFile::write_to(trajectory, 100, 10, unit_cell, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn header_fields_are_decoded() {
        let bytes = encode(&trajectory(4, 3), None);
        let header = DcdFile::read_header(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.frame_count, 3);
        assert_eq!(header.atom_count, 4);
        assert_eq!(header.start_step, 100);
        assert_eq!(header.save_interval, 10);
        assert!(!header.has_unit_cell);
        assert_eq!(header.title, ["molview trajectory"]);
        assert_eq!(header.frame_bytes(), ((4 * 3) + 6) * 4);
    }

    #[test]
    fn skipping_three_then_reading_two_of_ten_frames() {
        let bytes = encode(&trajectory(500, 10), None);
        let selection = FrameSelection::new(3, Some(2), 1);
        let read = DcdFile::read_from(&mut Cursor::new(bytes), &selection).unwrap();
        assert_eq!(read.len(), 2);
        for frame in read.frames() {
            assert_eq!(frame.coords.len(), 1500);
            assert_eq!(frame.atom_count, 500);
        }
        assert_eq!(read.frame(0).unwrap().step, Some(130));
        assert_eq!(read.frame(1).unwrap().step, Some(140));
    }

    #[test]
    fn coordinates_are_scaled_to_nanometres() {
        let source = trajectory(2, 2);
        let bytes = encode(&source, None);
        let read = DcdFile::read_from(&mut Cursor::new(bytes), &FrameSelection::all()).unwrap();
        assert_eq!(read.len(), 2);
        for (got, want) in read.frames()[1].coords.iter().zip(&source.frames()[1].coords) {
            assert!((got - want).abs() < 1e-4, "{got} vs {want}");
        }
    }

    #[test]
    fn unit_cell_records_are_skipped() {
        let cell = BoundingBox::rectangular(3.0, 3.0, 3.0);
        let bytes = encode(&trajectory(5, 4), Some(&cell));
        let header = DcdFile::read_header(&mut Cursor::new(&bytes)).unwrap();
        assert!(header.has_unit_cell);
        assert_eq!(header.frame_bytes(), ((5 * 3) + 6) * 4 + 56);

        let selection = FrameSelection::new(1, None, 2);
        let read = DcdFile::read_from(&mut Cursor::new(bytes), &selection).unwrap();
        let steps: Vec<_> = read.frames().iter().filter_map(|f| f.step).collect();
        assert_eq!(steps, [110, 130]);
    }

    #[test]
    fn truncated_final_frame_ends_the_trajectory() {
        let mut bytes = encode(&trajectory(6, 3), None);
        bytes.truncate(bytes.len() - 10);
        let read = DcdFile::read_from(&mut Cursor::new(bytes), &FrameSelection::all()).unwrap();
        assert_eq!(read.len(), 2);
    }

    #[test]
    fn fixed_atoms_are_rejected() {
        let mut bytes = encode(&trajectory(2, 1), None);
        // icntrl[8] sits after the 4-byte marker, the magic and eight integers.
        bytes[4 + 4 + 32] = 3;
        let err = DcdFile::read_header(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, ParseError::Binary(_)));
    }

    #[test]
    fn wrong_magic_is_unsupported() {
        let mut bytes = encode(&trajectory(2, 1), None);
        bytes[4..8].copy_from_slice(b"VELD");
        let err = DcdFile::read_header(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedFormat(_)));
    }
}
