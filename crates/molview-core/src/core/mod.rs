//! # Core Module
//!
//! Stateless building blocks of the ingestion pipeline.
//!
//! ## Architecture
//!
//! - **Classification Tables** ([`tables`]) - Element and residue lookup data
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, frames and trajectories
//! - **File I/O** ([`io`]) - Readers for GRO, PDB, XYZ, DCD, XTC and colour files; PDB/GRO writers
//! - **Spatial Indexing** ([`spatial`]) - A k-d tree generic over its coordinate type
//!
//! All positions handled by the core are expressed in nanometres. Formats storing Ångström
//! (PDB, DCD) are converted on ingest and on output.

pub mod io;
pub mod models;
pub mod spatial;
pub mod tables;
