//! Spatial indexing for neighbourhood queries over atom positions.

mod algebra;
mod kdtree;

pub use algebra::Algebra;
pub use kdtree::{KdTree, Neighbour};
