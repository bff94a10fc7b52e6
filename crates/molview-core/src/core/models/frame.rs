use nalgebra::Point3;

/// One trajectory snapshot: a flat `x, y, z` interleaved coordinate buffer in nanometres.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimaryStructureFrame {
    pub atom_count: usize,
    pub coords: Vec<f32>,
    pub step: Option<i32>,
    pub time: Option<f32>,
    /// Per-atom scalar values from a colour side-channel file.
    pub colours: Option<Vec<f32>>,
}

impl PrimaryStructureFrame {
    /// Wraps a coordinate buffer. The atom count is derived from its length.
    pub fn new(coords: Vec<f32>) -> Self {
        Self {
            atom_count: coords.len() / 3,
            coords,
            step: None,
            time: None,
            colours: None,
        }
    }

    pub fn with_step(mut self, step: i32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = Some(time);
        self
    }

    pub fn position(&self, atom_index: usize) -> Option<Point3<f32>> {
        let base = atom_index.checked_mul(3)?;
        let xyz = self.coords.get(base..base + 3)?;
        Some(Point3::new(xyz[0], xyz[1], xyz[2]))
    }

    pub fn colour(&self, atom_index: usize) -> Option<f32> {
        self.colours.as_ref()?.get(atom_index).copied()
    }
}

/// An ordered, append-only sequence of frames.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrimaryStructureTrajectory {
    frames: Vec<PrimaryStructureFrame>,
}

impl PrimaryStructureTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: PrimaryStructureFrame) {
        self.frames.push(frame);
    }

    pub fn frame(&self, index: usize) -> Option<&PrimaryStructureFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[PrimaryStructureFrame] {
        &self.frames
    }

    pub(crate) fn frames_mut(&mut self) -> &mut [PrimaryStructureFrame] {
        &mut self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Atom count of the first frame, or zero for an empty trajectory.
    pub fn atom_count(&self) -> usize {
        self.frames.first().map_or(0, |f| f.atom_count)
    }
}

impl FromIterator<PrimaryStructureFrame> for PrimaryStructureTrajectory {
    fn from_iter<T: IntoIterator<Item = PrimaryStructureFrame>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_reads_interleaved_coordinates() {
        let frame = PrimaryStructureFrame::new(vec![0.0, 0.1, 0.2, 1.0, 1.1, 1.2]);
        assert_eq!(frame.atom_count, 2);
        assert_eq!(frame.position(1), Some(Point3::new(1.0, 1.1, 1.2)));
        assert_eq!(frame.position(2), None);
        assert_eq!(frame.colour(0), None);
    }

    #[test]
    fn trajectory_appends_in_order() {
        let mut trajectory = PrimaryStructureTrajectory::new();
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.atom_count(), 0);
        trajectory.push(PrimaryStructureFrame::new(vec![0.0; 3]).with_step(0));
        trajectory.push(PrimaryStructureFrame::new(vec![1.0; 3]).with_step(10));
        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.atom_count(), 1);
        assert_eq!(trajectory.frame(1).and_then(|f| f.step), Some(10));
    }
}
