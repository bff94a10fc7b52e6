use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Where diagnostics go and how much of them.
///
/// Terminal output is compact and coloured; the optional log file gets the full format with
/// targets and thread ids. `RUST_LOG`, when set, overrides the level chosen by the flags.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// `-q` keeps errors only; each `-v` raises the level by one step from warnings.
    pub fn from_flags(verbosity: u8, quiet: bool, file: Option<PathBuf>) -> Self {
        let level = match (quiet, verbosity) {
            (true, _) => LevelFilter::ERROR,
            (false, 0) => LevelFilter::WARN,
            (false, 1) => LevelFilter::INFO,
            (false, 2) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        };
        Self { level, file }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy()
    }

    /// Installs the global subscriber. Fails if the log file cannot be created or a
    /// subscriber is already installed.
    pub fn install(&self) -> Result<()> {
        let file_layer = match &self.file {
            Some(path) => {
                let file = File::create(path).map_err(CliError::Io)?;
                Some(
                    fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_thread_ids(true),
                )
            }
            None => None,
        };
        let terminal_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact();

        tracing_subscriber::registry()
            .with(self.filter())
            .with(terminal_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| CliError::Other(anyhow::anyhow!(e)))
    }
}
