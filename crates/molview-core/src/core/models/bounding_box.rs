use nalgebra::{Matrix3, Point3, Vector3};

/// The simulation box of a structure, stored as three box vectors (nm).
///
/// Columns of `vectors` are the box vectors a, b and c. Rectangular boxes only use the
/// diagonal; triclinic boxes fill in the off-diagonal terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub vectors: Matrix3<f32>,
}

impl BoundingBox {
    pub fn rectangular(x: f32, y: f32, z: f32) -> Self {
        Self {
            vectors: Matrix3::from_diagonal(&Vector3::new(x, y, z)),
        }
    }

    /// Builds a box from the values of a GRO box line.
    ///
    /// GRO stores `v1(x) v2(y) v3(z) v1(y) v1(z) v2(x) v2(z) v3(x) v3(y)`; missing trailing
    /// values default to zero, so a three-value line yields a rectangular box.
    pub fn from_gro_values(values: &[f32]) -> Self {
        let v = |i: usize| values.get(i).copied().unwrap_or(0.0);
        let a = Vector3::new(v(0), v(3), v(4));
        let b = Vector3::new(v(5), v(1), v(6));
        let c = Vector3::new(v(7), v(8), v(2));
        Self {
            vectors: Matrix3::from_columns(&[a, b, c]),
        }
    }

    /// Builds a box from edge lengths and the alpha, beta, gamma angles in degrees
    /// (the `CRYST1` convention). Right angles yield an exactly rectangular box.
    pub fn from_lengths_angles(lengths: Vector3<f32>, angles: Vector3<f32>) -> Self {
        if angles.iter().all(|a| (a - 90.0).abs() < 1e-3) {
            return Self::rectangular(lengths.x, lengths.y, lengths.z);
        }
        let (alpha, beta, gamma) = (
            angles.x.to_radians(),
            angles.y.to_radians(),
            angles.z.to_radians(),
        );
        let a = Vector3::new(lengths.x, 0.0, 0.0);
        let b = Vector3::new(lengths.y * gamma.cos(), lengths.y * gamma.sin(), 0.0);
        let cx = beta.cos();
        let cy = (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz = (1.0 - cx * cx - cy * cy).max(0.0).sqrt();
        let c = Vector3::new(lengths.z * cx, lengths.z * cy, lengths.z * cz);
        Self {
            vectors: Matrix3::from_columns(&[a, b, c]),
        }
    }

    /// The nine GRO box values, in GRO order.
    pub fn to_gro_values(&self) -> [f32; 9] {
        let m = &self.vectors;
        [
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            m[(1, 0)],
            m[(2, 0)],
            m[(0, 1)],
            m[(2, 1)],
            m[(0, 2)],
            m[(1, 2)],
        ]
    }

    pub fn is_rectangular(&self) -> bool {
        let m = &self.vectors;
        m[(1, 0)] == 0.0
            && m[(2, 0)] == 0.0
            && m[(0, 1)] == 0.0
            && m[(2, 1)] == 0.0
            && m[(0, 2)] == 0.0
            && m[(1, 2)] == 0.0
    }

    /// Edge lengths |a|, |b|, |c|.
    pub fn lengths(&self) -> Vector3<f32> {
        Vector3::new(
            self.vectors.column(0).norm(),
            self.vectors.column(1).norm(),
            self.vectors.column(2).norm(),
        )
    }

    /// Angles alpha (b,c), beta (a,c), gamma (a,b) in degrees.
    pub fn angles(&self) -> Vector3<f32> {
        let a = self.vectors.column(0).into_owned();
        let b = self.vectors.column(1).into_owned();
        let c = self.vectors.column(2).into_owned();
        let angle = |u: &Vector3<f32>, w: &Vector3<f32>| {
            if u.norm() == 0.0 || w.norm() == 0.0 {
                90.0
            } else {
                u.angle(w).to_degrees()
            }
        };
        Vector3::new(angle(&b, &c), angle(&a, &c), angle(&a, &b))
    }

    /// The smallest axis-aligned box starting at the origin that contains every point.
    ///
    /// Returns `None` for an empty point set.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first.coords, first.coords);
        for p in iter {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
        }
        let extent = max - min;
        Some(Self::rectangular(extent.x, extent.y, extent.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_gro_values_produce_a_rectangular_box() {
        let bbox = BoundingBox::from_gro_values(&[1.0, 2.0, 3.0]);
        assert!(bbox.is_rectangular());
        assert_eq!(bbox.lengths(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(bbox.to_gro_values()[..3], [1.0, 2.0, 3.0]);
    }

    #[test]
    fn nine_gro_values_round_trip() {
        let values = [5.0, 4.0, 3.0, 0.0, 0.0, 1.0, 0.0, 0.5, 0.5];
        let bbox = BoundingBox::from_gro_values(&values);
        assert!(!bbox.is_rectangular());
        assert_eq!(bbox.to_gro_values(), values);
    }

    #[test]
    fn rectangular_angles_are_right_angles() {
        let angles = BoundingBox::rectangular(1.0, 1.0, 1.0).angles();
        for a in angles.iter() {
            assert!((a - 90.0).abs() < 1e-4);
        }
    }

    #[test]
    fn lengths_and_angles_reproduce_the_cell() {
        let rect = BoundingBox::from_lengths_angles(
            Vector3::new(2.0, 3.0, 4.0),
            Vector3::new(90.0, 90.0, 90.0),
        );
        assert!(rect.is_rectangular());

        let tric = BoundingBox::from_lengths_angles(
            Vector3::new(2.0, 2.0, 2.0),
            Vector3::new(90.0, 90.0, 60.0),
        );
        assert!(!tric.is_rectangular());
        let lengths = tric.lengths();
        assert!((lengths.y - 2.0).abs() < 1e-5);
        assert!((tric.angles().z - 60.0).abs() < 1e-3);
    }

    #[test]
    fn enclosing_box_spans_point_extent() {
        let points = [Point3::new(0.0, 1.0, 2.0), Point3::new(1.0, 3.0, 2.5)];
        let bbox = BoundingBox::enclosing(points.iter()).unwrap();
        assert_eq!(bbox.lengths(), Vector3::new(1.0, 2.0, 0.5));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }
}
