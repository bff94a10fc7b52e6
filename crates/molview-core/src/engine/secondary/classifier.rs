use crate::engine::config::ClassifierConfig;
use crate::engine::error::ClassificationError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, instrument, warn};

/// An external secondary-structure assignment program.
pub trait Classifier {
    /// Runs the classifier on a PDB file and returns its standard output.
    fn classify(&self, pdb_path: &Path) -> Result<String, ClassificationError>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, pdb_path: &Path) -> Result<String, ClassificationError> {
        (**self).classify(pdb_path)
    }
}

/// Invokes a STRIDE-compatible executable as `<executable> <pdb path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrideClassifier {
    executable: PathBuf,
}

impl StrideClassifier {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.executable.clone())
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl Classifier for StrideClassifier {
    #[instrument(skip_all, name = "stride", fields(input = %pdb_path.display()))]
    fn classify(&self, pdb_path: &Path) -> Result<String, ClassificationError> {
        // `output` drains stdout and stderr concurrently before waiting on the child.
        let output = Command::new(&self.executable)
            .arg(pdb_path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    ClassificationError::ExecutableNotFound(self.executable.display().to_string())
                }
                _ => ClassificationError::Io(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() {
                ClassificationError::NoOutput
            } else {
                ClassificationError::Failed(stderr)
            });
        }
        if !output.status.success() {
            warn!(status = %output.status, "Classifier exited unsuccessfully.");
        }
        debug!(bytes = stdout.len(), "Classifier finished.");
        Ok(stdout)
    }
}
