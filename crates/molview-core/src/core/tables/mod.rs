//! Static classification data used while parsing.
//!
//! - [`elements`] - chemical elements, their radii and atom-name based inference
//! - [`residues`] - standard residue categories and amino-acid backbone atom names

pub mod elements;
pub mod residues;
