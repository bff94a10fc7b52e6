//! GROMACS XTC trajectories.
//!
//! Frames are big-endian XDR records. Systems of up to nine atoms store plain floats;
//! larger systems use the lossy integer compression scheme: coordinates are scaled by a
//! precision, offset by a per-frame minimum, and packed as mixed-radix integers with a
//! run-length mode for small deltas between neighbouring atoms.

use super::error::ParseError;
use super::traits::{FrameSelection, FrameSource, TrajectoryFile};
use crate::core::models::frame::{PrimaryStructureFrame, PrimaryStructureTrajectory};
use std::io::{self, BufRead, Read, Seek, SeekFrom};
use tracing::{debug, instrument};

const MAGIC: i32 = 1995;
const UNCOMPRESSED_LIMIT: usize = 9;
const FIRST_IDX: usize = 9;
const MAX_PACKED_BITS: u32 = 32 * 8;

#[rustfmt::skip]
const MAGIC_INTS: [i32; 73] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 10, 12, 16, 20, 25, 32, 40, 50, 64,
    80, 101, 128, 161, 203, 256, 322, 406, 512, 645, 812, 1024, 1290,
    1625, 2048, 2580, 3250, 4096, 5060, 6501, 8192, 10321, 13003,
    16384, 20642, 26007, 32768, 41285, 52015, 65536, 82570, 104031,
    131072, 165140, 208063, 262144, 330280, 416127, 524287, 660561,
    832255, 1048576, 1321122, 1664510, 2097152, 2642245, 3329021,
    4194304, 5284491, 6658042, 8388607, 10568983, 13316085, 16777216,
];

fn read_i32(reader: &mut impl Read) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn read_f32(reader: &mut impl Read) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_be_bytes(buf))
}

/// Number of bits needed to represent `size`.
fn size_of_int(size: u32) -> u32 {
    let mut num: u64 = 1;
    let mut bits = 0;
    while u64::from(size) >= num && bits < 32 {
        bits += 1;
        num <<= 1;
    }
    bits
}

/// Number of bits needed to represent the mixed-radix product of `sizes`.
fn size_of_ints(sizes: &[u32; 3]) -> u32 {
    let mut bytes = [0u64; 32];
    bytes[0] = 1;
    let mut num_of_bytes = 1;
    for &size in sizes {
        let mut tmp = 0u64;
        let mut count = 0;
        while count < num_of_bytes {
            tmp += bytes[count] * u64::from(size);
            bytes[count] = tmp & 0xff;
            tmp >>= 8;
            count += 1;
        }
        while tmp != 0 && count < bytes.len() {
            bytes[count] = tmp & 0xff;
            tmp >>= 8;
            count += 1;
        }
        num_of_bytes = count;
    }
    let top = num_of_bytes - 1;
    let mut num = 1u64;
    let mut bits = 0;
    while bytes[top] >= num {
        bits += 1;
        num <<= 1;
    }
    bits + top as u32 * 8
}

/// MSB-first reader over the packed coordinate bytes.
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn read_bits(&mut self, count: u32) -> Result<u32, ParseError> {
        let mut value = 0u32;
        for _ in 0..count {
            let byte = self.data.get(self.position / 8).ok_or_else(|| {
                ParseError::Binary("compressed coordinate stream ended early".into())
            })?;
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.position += 1;
        }
        Ok(value)
    }

    fn read_ints(&mut self, bit_count: u32, sizes: &[u32; 3]) -> Result<[i32; 3], ParseError> {
        if bit_count > MAX_PACKED_BITS {
            return Err(ParseError::Binary(format!(
                "packed integer width {bit_count} is out of range"
            )));
        }
        let mut bytes = [0u64; 32];
        let mut num_of_bytes = 0;
        let mut remaining = bit_count;
        while remaining > 8 {
            bytes[num_of_bytes] = u64::from(self.read_bits(8)?);
            num_of_bytes += 1;
            remaining -= 8;
        }
        if remaining > 0 {
            bytes[num_of_bytes] = u64::from(self.read_bits(remaining)?);
            num_of_bytes += 1;
        }

        let mut nums = [0i32; 3];
        for i in (1..3).rev() {
            let size = u64::from(sizes[i].max(1));
            let mut num = 0u64;
            for j in (0..num_of_bytes).rev() {
                num = (num << 8) | bytes[j];
                let quotient = num / size;
                bytes[j] = quotient;
                num -= quotient * size;
            }
            nums[i] = num as i32;
        }
        nums[0] = (bytes[0] | (bytes[1] << 8) | (bytes[2] << 16) | (bytes[3] << 24)) as u32 as i32;
        Ok(nums)
    }
}

fn magic_int(index: i32) -> Result<i32, ParseError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| MAGIC_INTS.get(i))
        .copied()
        .ok_or_else(|| ParseError::Binary(format!("small-delta index {index} is out of range")))
}

/// Expands the packed coordinate block of one frame into nanometres.
fn decompress(
    data: &[u8],
    atom_count: usize,
    precision: f32,
    min_int: [i32; 3],
    max_int: [i32; 3],
    small_idx: i32,
) -> Result<Vec<f32>, ParseError> {
    if precision <= 0.0 {
        return Err(ParseError::Binary(format!("invalid precision {precision}")));
    }
    let inv_precision = 1.0 / precision;

    let mut size_int = [0u32; 3];
    for k in 0..3 {
        let span = i64::from(max_int[k]) - i64::from(min_int[k]) + 1;
        size_int[k] = u32::try_from(span)
            .map_err(|_| ParseError::Binary("coordinate bounds are inverted".into()))?;
    }
    let (bit_size, bit_size_int) = if (size_int[0] | size_int[1] | size_int[2]) > 0xff_ffff {
        (
            0,
            [
                size_of_int(size_int[0]),
                size_of_int(size_int[1]),
                size_of_int(size_int[2]),
            ],
        )
    } else {
        (size_of_ints(&size_int), [0; 3])
    };

    if small_idx < FIRST_IDX as i32 {
        return Err(ParseError::Binary(format!(
            "small-delta index {small_idx} is out of range"
        )));
    }
    let mut small_idx = small_idx;
    let mut smaller = magic_int((small_idx - 1).max(FIRST_IDX as i32))? / 2;
    let mut small_num = magic_int(small_idx)? / 2;
    let mut size_small = magic_int(small_idx)? as u32;

    let mut bits = BitReader::new(data);
    let mut coords = Vec::with_capacity(atom_count * 3);
    let push = |coord: [i32; 3], coords: &mut Vec<f32>| -> Result<(), ParseError> {
        if coords.len() >= atom_count * 3 {
            return Err(ParseError::Binary(
                "compressed block decodes to more atoms than declared".into(),
            ));
        }
        coords.extend(coord.iter().map(|&v| v as f32 * inv_precision));
        Ok(())
    };

    let mut run = 0i32;
    let mut decoded = 0usize;
    while decoded < atom_count {
        let mut this = if bit_size == 0 {
            [
                bits.read_bits(bit_size_int[0])? as i32,
                bits.read_bits(bit_size_int[1])? as i32,
                bits.read_bits(bit_size_int[2])? as i32,
            ]
        } else {
            bits.read_ints(bit_size, &size_int)?
        };
        decoded += 1;
        for k in 0..3 {
            this[k] = this[k].wrapping_add(min_int[k]);
        }
        let mut prev = this;

        let mut is_smaller = 0;
        if bits.read_bits(1)? == 1 {
            run = bits.read_bits(5)? as i32;
            is_smaller = run % 3;
            run -= is_smaller;
            is_smaller -= 1;
        }

        if run > 0 {
            let sizes = [size_small; 3];
            let mut k = 0;
            while k < run {
                let mut current = bits.read_ints(small_idx as u32, &sizes)?;
                decoded += 1;
                for d in 0..3 {
                    current[d] = current[d].wrapping_add(prev[d] - small_num);
                }
                if k == 0 {
                    // The first small atom is stored before the large one.
                    std::mem::swap(&mut current, &mut prev);
                    push(prev, &mut coords)?;
                } else {
                    prev = current;
                }
                push(current, &mut coords)?;
                k += 3;
            }
        } else {
            push(this, &mut coords)?;
        }

        small_idx += is_smaller;
        if is_smaller < 0 {
            small_num = smaller;
            smaller = if small_idx > FIRST_IDX as i32 {
                magic_int(small_idx - 1)? / 2
            } else {
                0
            };
        } else if is_smaller > 0 {
            smaller = small_num;
            small_num = magic_int(small_idx)? / 2;
        }
        size_small = magic_int(small_idx)? as u32;
    }

    if coords.len() != atom_count * 3 {
        return Err(ParseError::Binary(format!(
            "compressed block decoded {} coordinates, expected {}",
            coords.len(),
            atom_count * 3
        )));
    }
    Ok(coords)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct XtcFrameHeader {
    atom_count: usize,
    step: i32,
    time: f32,
}

struct XtcFrames<'r, R> {
    reader: &'r mut R,
    atom_count: Option<usize>,
}

impl<R: Read + Seek> XtcFrames<'_, R> {
    /// Reads the frame header up to and including the coordinate-block atom count.
    fn read_header(&mut self) -> Result<XtcFrameHeader, ParseError> {
        let reader = &mut *self.reader;
        let magic = read_i32(reader)?;
        if magic != MAGIC {
            return Err(ParseError::UnsupportedFormat(format!(
                "bad XTC frame magic {magic} (expected {MAGIC})"
            )));
        }
        let atom_count = usize::try_from(read_i32(reader)?)
            .map_err(|_| ParseError::Binary("negative atom count".into()))?;
        let step = read_i32(reader)?;
        let time = read_f32(reader)?;
        for _ in 0..9 {
            read_f32(reader)?;
        }
        let block_atoms = read_i32(reader)?;
        if usize::try_from(block_atoms).ok() != Some(atom_count) {
            return Err(ParseError::Inconsistent(format!(
                "frame declares {atom_count} atoms but its coordinate block holds {block_atoms}"
            )));
        }
        match self.atom_count {
            Some(expected) if expected != atom_count => {
                return Err(ParseError::Inconsistent(format!(
                    "atom count changed from {expected} to {atom_count} between frames"
                )));
            }
            _ => self.atom_count = Some(atom_count),
        }
        Ok(XtcFrameHeader {
            atom_count,
            step,
            time,
        })
    }

    fn read_body(&mut self, header: &XtcFrameHeader) -> Result<Vec<f32>, ParseError> {
        let reader = &mut *self.reader;
        let atom_count = header.atom_count;
        if atom_count <= UNCOMPRESSED_LIMIT {
            return (0..atom_count * 3)
                .map(|_| read_f32(reader).map_err(ParseError::from))
                .collect();
        }

        let precision = read_f32(reader)?;
        let mut min_int = [0i32; 3];
        let mut max_int = [0i32; 3];
        for value in &mut min_int {
            *value = read_i32(reader)?;
        }
        for value in &mut max_int {
            *value = read_i32(reader)?;
        }
        let small_idx = read_i32(reader)?;
        let byte_count = usize::try_from(read_i32(reader)?)
            .map_err(|_| ParseError::Binary("negative compressed block size".into()))?;
        let mut data = vec![0u8; byte_count.next_multiple_of(4)];
        reader.read_exact(&mut data)?;
        decompress(
            &data[..byte_count],
            atom_count,
            precision,
            min_int,
            max_int,
            small_idx,
        )
    }

    fn skip_body(&mut self, header: &XtcFrameHeader) -> Result<(), ParseError> {
        let reader = &mut *self.reader;
        if header.atom_count <= UNCOMPRESSED_LIMIT {
            reader.seek(SeekFrom::Current((header.atom_count * 12) as i64))?;
            return Ok(());
        }
        // precision, min ints, max ints, small index
        reader.seek(SeekFrom::Current(4 + 12 + 12 + 4))?;
        let byte_count = usize::try_from(read_i32(reader)?)
            .map_err(|_| ParseError::Binary("negative compressed block size".into()))?;
        reader.seek(SeekFrom::Current(byte_count.next_multiple_of(4) as i64))?;
        Ok(())
    }
}

fn end_of_stream_as<T>(result: Result<T, ParseError>, end: T) -> Result<T, ParseError> {
    match result {
        Err(e) if e.is_end_of_stream() => Ok(end),
        other => other,
    }
}

impl<R: Read + Seek> FrameSource for XtcFrames<'_, R> {
    fn skip_frame(&mut self) -> Result<bool, ParseError> {
        let skipped = self.read_header().and_then(|header| self.skip_body(&header));
        end_of_stream_as(skipped.map(|()| true), false)
    }

    fn next_frame(&mut self) -> Result<Option<PrimaryStructureFrame>, ParseError> {
        let frame = self.read_header().and_then(|header| {
            let coords = self.read_body(&header)?;
            Ok(Some(
                PrimaryStructureFrame::new(coords)
                    .with_step(header.step)
                    .with_time(header.time),
            ))
        });
        end_of_stream_as(frame, None)
    }
}

pub struct XtcFile;

impl TrajectoryFile for XtcFile {
    #[instrument(skip_all, name = "xtc_read")]
    fn read_from<R: BufRead + Seek>(
        reader: &mut R,
        selection: &FrameSelection,
    ) -> Result<PrimaryStructureTrajectory, ParseError> {
        let mut frames = XtcFrames {
            reader,
            atom_count: None,
        };
        let trajectory = selection.collect_from(&mut frames)?;
        debug!(
            frames = trajectory.len(),
            atoms = trajectory.atom_count(),
            "Read XTC trajectory"
        );
        Ok(trajectory)
    }
}
