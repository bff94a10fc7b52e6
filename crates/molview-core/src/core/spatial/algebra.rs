use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

/// Numeric operations a coordinate type must provide to be indexed by a [`super::KdTree`].
///
/// Implemented for `f32` and `f64`; the choice is resolved at compile time through the
/// tree's type parameter.
pub trait Algebra:
    Copy
    + PartialOrd
    + Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + 'static
{
    const ZERO: Self;

    fn sqrt(self) -> Self;

    /// Total order used to break ties; NaN sorts last.
    fn total_cmp(&self, other: &Self) -> std::cmp::Ordering;

    fn squared_distance<const K: usize>(a: &[Self; K], b: &[Self; K]) -> Self {
        a.iter().zip(b).fold(Self::ZERO, |acc, (&x, &y)| {
            let d = x - y;
            acc + d * d
        })
    }
}

macro_rules! impl_algebra {
    ($($t:ty),*) => {
        $(
            impl Algebra for $t {
                const ZERO: Self = 0.0;

                fn sqrt(self) -> Self {
                    <$t>::sqrt(self)
                }

                fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
                    <$t>::total_cmp(self, other)
                }
            }
        )*
    };
}

impl_algebra!(f32, f64);
