//! # molview Core Library
//!
//! The ingestion and derivation core of a molecular-dynamics visualizer: it reads structure and
//! trajectory files, builds an in-memory structural model, infers covalent bonds geometrically and
//! assigns secondary structure through an external classifier program.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Static classification tables, the structural model
//!   (`PrimaryStructure`, frames, trajectories), format readers/writers and the generic k-d tree.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the multi-threaded bond inference engine, the
//!   secondary-structure pipeline with its per-frame cache, progress reporting and error types.
//!
//! - **[`workflows`]: The Public API.** Format detection and one-call loading of a structure together
//!   with its trajectory and colour side channel.

pub mod core;
pub mod engine;
pub mod workflows;
