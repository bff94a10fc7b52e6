//! # Core Models Module
//!
//! The in-memory structural model populated by the format readers.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms with element, position and denormalized parent references
//! - [`residue`] - Residues with their atom sets and amino-acid backbone references
//! - [`chain`] - Chains with derived main-chain residue and atom lists
//! - [`structure`] - [`PrimaryStructure`](structure::PrimaryStructure), the owner of all of the above, plus read-side queries
//! - [`builder`] - Incremental structure construction used by the readers
//! - [`frame`] - Trajectory frames and trajectories
//! - [`bond`] - Canonical atom-pair bonds
//! - [`secondary`] - Per-residue secondary-structure classifications
//! - [`bounding_box`] - Simulation box vectors

pub mod atom;
pub mod bond;
pub mod bounding_box;
pub mod builder;
pub mod chain;
pub mod frame;
pub mod residue;
pub mod secondary;
pub mod structure;
