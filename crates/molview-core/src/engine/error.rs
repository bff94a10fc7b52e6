use super::config::{BondTableError, ConfigError};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Bond length table error: {source}")]
    BondTable {
        #[from]
        source: BondTableError,
    },
}

/// Failure to obtain a secondary-structure assignment from the external classifier.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Classifier executable '{0}' could not be found")]
    ExecutableNotFound(String),

    #[error("Classifier reported a failure: {0}")]
    Failed(String),

    #[error("Classifier produced no output")]
    NoOutput,

    #[error("Classifier output is malformed: {0}")]
    InvalidOutput(String),

    #[error("I/O error while running the classifier: {0}")]
    Io(#[from] io::Error),

    #[error("Frame {frame} previously failed classification")]
    PreviouslyFailed { frame: usize },

    #[error("Frame {frame} is out of range for a trajectory of {len} frames")]
    FrameOutOfRange { frame: usize, len: usize },
}
