//! Readers and writers for the supported molecular file formats.
//!
//! Single-structure formats (GRO, PDB, XYZ) implement [`traits::StructureFile`], trajectory
//! formats (DCD, XTC and GRO-framed positions) implement [`traits::TrajectoryFile`] and share
//! frame selection through [`traits::FrameSelection`]. Colour files are a per-atom scalar side
//! channel attached to an already loaded trajectory.

pub mod colour;
pub mod dcd;
pub mod error;
pub mod gro;
pub mod pdb;
pub mod positions;
pub mod traits;
pub mod xtc;
pub mod xyz;
