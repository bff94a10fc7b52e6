use super::file::{FileBondsConfig, FileConfig};
use crate::error::{CliError, Result};
use molview::engine::config::{BondLengthTable, CoreConfig, CoreConfigBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Values given on the command line; they take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub threads: Option<usize>,
    pub max_bond_length: Option<f32>,
    pub classifier: Option<PathBuf>,
}

pub fn build_config(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<CoreConfig> {
    let file_config = match config_path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    merge(file_config, overrides)
}

fn merge(mut file_config: FileConfig, overrides: &CliOverrides) -> Result<CoreConfig> {
    let bonds_file = file_config.bonds.take().unwrap_or_default();
    let classifier_file = file_config.classifier.take().unwrap_or_default();
    let colours_file = file_config.colours.take().unwrap_or_default();

    let mut builder = CoreConfigBuilder::new().element_pair_lengths(pair_table(&bonds_file)?);

    if let Some(length) = overrides.max_bond_length.or(bonds_file.max_length) {
        builder = builder.max_bond_length(length);
    }
    if let Some(length) = bonds_file.hydrogen_length {
        builder = builder.hydrogen_bond_length(length);
    }
    if let Some(count) = bonds_file.max_per_atom {
        builder = builder.max_bonds_per_atom(count);
    }
    if let Some(exe) = overrides
        .classifier
        .clone()
        .or(classifier_file.executable)
    {
        builder = builder.classifier_executable(exe);
    }
    if let Some(threads) = overrides.threads.or(file_config.threads) {
        builder = builder.processor_cores(threads);
    }
    if let Some(value) = colours_file.default {
        builder = builder.colour_default(value);
    }

    let config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!(?config, "Resolved configuration.");
    Ok(config)
}

/// The standard table, overlaid with the CSV table and then the inline pairs.
fn pair_table(bonds: &FileBondsConfig) -> Result<BondLengthTable> {
    let mut table = BondLengthTable::standard();
    if let Some(path) = &bonds.pair_table {
        table.extend(BondLengthTable::load_csv(path)?);
    }
    table.extend(BondLengthTable::from_pairs(
        bonds.pairs.iter().map(|(k, v)| (k.as_str(), *v)),
    )?);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use molview::core::tables::elements::Element;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = build_config(None, &CliOverrides::default()).unwrap();
        assert_eq!(config.bonds.max_bond_length, 0.21);
        assert_eq!(config.classifier.executable, PathBuf::from("stride"));
        assert!(config.processor_cores >= 1);
    }

    #[test]
    fn cli_overrides_win_over_the_file() {
        let file = FileConfig {
            bonds: Some(FileBondsConfig {
                max_length: Some(0.2),
                ..Default::default()
            }),
            threads: Some(2),
            ..Default::default()
        };
        let overrides = CliOverrides {
            threads: Some(8),
            max_bond_length: Some(0.18),
            classifier: Some(PathBuf::from("/usr/bin/stride")),
        };
        let config = merge(file, &overrides).unwrap();
        assert_eq!(config.processor_cores, 8);
        assert_eq!(config.bonds.max_bond_length, 0.18);
        assert_eq!(config.classifier.executable, PathBuf::from("/usr/bin/stride"));
    }

    #[test]
    fn inline_pairs_override_the_csv_table() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("bonds.csv");
        fs::write(&csv, "element_a,element_b,max_length\nC,N,0.17\nZn,S,0.25\n").unwrap();

        let bonds = FileBondsConfig {
            pair_table: Some(csv),
            pairs: BTreeMap::from([("N-C".to_string(), 0.14)]),
            ..Default::default()
        };
        let table = pair_table(&bonds).unwrap();
        assert_eq!(table.get(Element::C, Element::N), Some(0.14));
        assert_eq!(table.get(Element::S, Element::Zn), Some(0.25));
        assert_eq!(table.get(Element::C, Element::C), Some(0.16));
    }

    #[test]
    fn invalid_values_become_config_errors() {
        let overrides = CliOverrides {
            max_bond_length: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            build_config(None, &overrides),
            Err(CliError::Config(_))
        ));
    }
}
