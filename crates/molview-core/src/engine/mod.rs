//! # Engine Module
//!
//! Computational services layered on top of the structural model.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Bond length rules, classifier location and worker count
//! - **Bond Inference** ([`bonds`]) - Distance-based bond detection over a k-d tree, split
//!   across a worker pool
//! - **Secondary Structure** ([`secondary`]) - External classifier invocation, output parsing
//!   and per-frame caching for trajectories
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine and classification error types
//!
//! Nothing in the engine holds global state: every operation receives its configuration
//! explicitly.

pub mod bonds;
pub mod config;
pub mod error;
pub mod progress;
pub mod secondary;
