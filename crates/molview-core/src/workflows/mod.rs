//! # Workflows Module
//!
//! User-facing entry points that combine the readers of [`crate::core::io`] into complete
//! loading operations.
//!
//! - **Loading** ([`load`]) - Format detection by file extension, one-call loading of a
//!   structure with its trajectory and colour side channel, and structure export.

pub mod load;
