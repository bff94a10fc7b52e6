use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileBondsConfig {
    pub max_length: Option<f32>,
    pub hydrogen_length: Option<f32>,
    pub max_per_atom: Option<usize>,
    /// CSV file of `element_a,element_b,max_length` records.
    pub pair_table: Option<PathBuf>,
    /// Inline pair lengths such as `"C-N" = 0.155`; these win over `pair-table`.
    #[serde(default)]
    pub pairs: BTreeMap<String, f32>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileClassifierConfig {
    pub executable: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileColoursConfig {
    pub default: Option<f32>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub bonds: Option<FileBondsConfig>,
    pub classifier: Option<FileClassifierConfig>,
    pub colours: Option<FileColoursConfig>,
    pub threads: Option<usize>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: FileConfig =
            toml::from_str(&content).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
        config.resolve_relative_paths(path.parent().unwrap_or(Path::new(".")));
        Ok(config)
    }

    /// Paths inside the file are relative to the file's own directory.
    fn resolve_relative_paths(&mut self, base: &Path) {
        if let Some(table) = self
            .bonds
            .as_mut()
            .and_then(|b| b.pair_table.as_mut())
            .filter(|p| p.is_relative())
        {
            *table = base.join(&*table);
        }
    }
}
