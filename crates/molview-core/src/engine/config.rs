use crate::core::tables::elements::Element;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum BondTableError {
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Unknown element in bond pair '{pair}'")]
    UnknownElement { pair: String },
    #[error("Bond pair '{pair}' must be written as two element symbols joined by '-'")]
    MalformedPair { pair: String },
    #[error("Bond length for '{pair}' must be a positive number of nanometres (got {length})")]
    InvalidLength { pair: String, length: f32 },
}

#[derive(Debug, Deserialize)]
struct BondLengthRecord {
    element_a: String,
    element_b: String,
    max_length: f32,
}

/// Maximum bond lengths in nanometres keyed by unordered element pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BondLengthTable {
    lengths: HashMap<(Element, Element), f32>,
}

#[rustfmt::skip]
const STANDARD_LENGTHS: &[(Element, Element, f32)] = &[
    (Element::C, Element::C, 0.160),  (Element::C, Element::N, 0.155),
    (Element::C, Element::O, 0.150),  (Element::C, Element::S, 0.190),
    (Element::C, Element::F, 0.145),  (Element::C, Element::Cl, 0.185),
    (Element::C, Element::Br, 0.200), (Element::C, Element::Se, 0.200),
    (Element::N, Element::N, 0.150),  (Element::N, Element::O, 0.145),
    (Element::O, Element::P, 0.170),  (Element::O, Element::S, 0.165),
    (Element::S, Element::S, 0.210),
];

impl BondLengthTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Common heavy-atom pairs found in biomolecules.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for &(a, b, length) in STANDARD_LENGTHS {
            table.insert(a, b, length);
        }
        table
    }

    fn key(a: Element, b: Element) -> (Element, Element) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn insert(&mut self, a: Element, b: Element, max_length: f32) {
        self.lengths.insert(Self::key(a, b), max_length);
    }

    pub fn get(&self, a: Element, b: Element) -> Option<f32> {
        self.lengths.get(&Self::key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Overrides entries of `self` with those of `other`.
    pub fn extend(&mut self, other: BondLengthTable) {
        self.lengths.extend(other.lengths);
    }

    fn checked_insert(
        &mut self,
        a: &str,
        b: &str,
        max_length: f32,
    ) -> Result<(), BondTableError> {
        let pair = format!("{a}-{b}");
        let (Some(ea), Some(eb)) = (Element::from_symbol(a), Element::from_symbol(b)) else {
            return Err(BondTableError::UnknownElement { pair });
        };
        if !(max_length.is_finite() && max_length > 0.0) {
            return Err(BondTableError::InvalidLength {
                pair,
                length: max_length,
            });
        }
        self.insert(ea, eb, max_length);
        Ok(())
    }

    /// Builds a table from `"C-N" = 0.155` style entries.
    pub fn from_pairs<S: AsRef<str>>(
        pairs: impl IntoIterator<Item = (S, f32)>,
    ) -> Result<Self, BondTableError> {
        let mut table = Self::new();
        for (label, length) in pairs {
            let label = label.as_ref();
            let Some((a, b)) = label.split_once('-') else {
                return Err(BondTableError::MalformedPair { pair: label.into() });
            };
            table.checked_insert(a.trim(), b.trim(), length)?;
        }
        Ok(table)
    }

    /// Reads `element_a,element_b,max_length` records (with header).
    pub fn from_csv_reader<R: io::Read>(reader: R, source: &str) -> Result<Self, BondTableError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut table = Self::new();
        for result in reader.deserialize::<BondLengthRecord>() {
            let record = result.map_err(|e| BondTableError::Csv {
                path: source.to_string(),
                source: e,
            })?;
            table.checked_insert(&record.element_a, &record.element_b, record.max_length)?;
        }
        Ok(table)
    }

    pub fn load_csv(path: &Path) -> Result<Self, BondTableError> {
        let file = std::fs::File::open(path).map_err(|e| BondTableError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_csv_reader(file, &path.to_string_lossy())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BondConfig {
    /// Search radius and upper bound for every bond.
    pub max_bond_length: f32,
    /// Used for pairs involving hydrogen that have no table entry.
    pub hydrogen_bond_length: f32,
    pub max_bonds_per_atom: usize,
    pub element_pair_lengths: BondLengthTable,
}

/// Covers the longest entry of the standard table (S-S).
const DEFAULT_MAX_BOND_LENGTH: f32 = 0.21;

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            max_bond_length: DEFAULT_MAX_BOND_LENGTH,
            hydrogen_bond_length: 0.11,
            max_bonds_per_atom: 8,
            element_pair_lengths: BondLengthTable::standard(),
        }
    }
}

impl BondConfig {
    /// Table entry, else the hydrogen default when either element is hydrogen, else the global
    /// maximum. Never exceeds the global maximum.
    pub fn resolve_length(&self, a: Element, b: Element) -> f32 {
        let length = match self.element_pair_lengths.get(a, b) {
            Some(length) => length,
            None if a.is_hydrogen() || b.is_hydrogen() => self.hydrogen_bond_length,
            None => self.max_bond_length,
        };
        length.min(self.max_bond_length)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("max_bond_length", self.max_bond_length),
            ("hydrogen_bond_length", self.hydrogen_bond_length),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    name,
                    reason: format!("expected a positive length in nm, got {value}"),
                });
            }
        }
        if self.max_bonds_per_atom == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_bonds_per_atom",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub executable: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("stride"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    pub bonds: BondConfig,
    pub classifier: ClassifierConfig,
    pub processor_cores: usize,
    pub colour_default: f32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            bonds: BondConfig::default(),
            classifier: ClassifierConfig::default(),
            processor_cores: available_cores(),
            colour_default: 0.0,
        }
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[derive(Default)]
pub struct CoreConfigBuilder {
    max_bond_length: Option<f32>,
    hydrogen_bond_length: Option<f32>,
    max_bonds_per_atom: Option<usize>,
    element_pair_lengths: Option<BondLengthTable>,
    classifier_executable: Option<PathBuf>,
    processor_cores: Option<usize>,
    colour_default: Option<f32>,
}

impl CoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_bond_length(mut self, length: f32) -> Self {
        self.max_bond_length = Some(length);
        self
    }
    pub fn hydrogen_bond_length(mut self, length: f32) -> Self {
        self.hydrogen_bond_length = Some(length);
        self
    }
    pub fn max_bonds_per_atom(mut self, count: usize) -> Self {
        self.max_bonds_per_atom = Some(count);
        self
    }
    pub fn element_pair_lengths(mut self, table: BondLengthTable) -> Self {
        self.element_pair_lengths = Some(table);
        self
    }
    pub fn classifier_executable(mut self, path: PathBuf) -> Self {
        self.classifier_executable = Some(path);
        self
    }
    pub fn processor_cores(mut self, cores: usize) -> Self {
        self.processor_cores = Some(cores);
        self
    }
    pub fn colour_default(mut self, value: f32) -> Self {
        self.colour_default = Some(value);
        self
    }

    pub fn build(self) -> Result<CoreConfig, ConfigError> {
        let defaults = BondConfig::default();
        let bonds = BondConfig {
            max_bond_length: self.max_bond_length.unwrap_or(defaults.max_bond_length),
            hydrogen_bond_length: self
                .hydrogen_bond_length
                .unwrap_or(defaults.hydrogen_bond_length),
            max_bonds_per_atom: self
                .max_bonds_per_atom
                .unwrap_or(defaults.max_bonds_per_atom),
            element_pair_lengths: self
                .element_pair_lengths
                .unwrap_or(defaults.element_pair_lengths),
        };
        bonds.validate()?;

        let processor_cores = self.processor_cores.unwrap_or_else(available_cores);
        if processor_cores == 0 {
            return Err(ConfigError::InvalidValue {
                name: "processor_cores",
                reason: "must be at least 1".into(),
            });
        }

        Ok(CoreConfig {
            bonds,
            classifier: self
                .classifier_executable
                .map(|executable| ClassifierConfig { executable })
                .unwrap_or_default(),
            processor_cores,
            colour_default: self.colour_default.unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn resolve_length_falls_back_through_hydrogen_to_global_max() {
        let config = BondConfig::default();
        assert_eq!(config.resolve_length(Element::N, Element::C), 0.155);
        assert_eq!(config.resolve_length(Element::O, Element::H), 0.11);
        assert_eq!(config.resolve_length(Element::Zn, Element::Fe), 0.21);
        assert_eq!(config.resolve_length(Element::S, Element::S), 0.21);

        let narrow = BondConfig {
            max_bond_length: 0.19,
            ..BondConfig::default()
        };
        assert_eq!(narrow.resolve_length(Element::S, Element::S), 0.19);
        assert_eq!(narrow.resolve_length(Element::C, Element::Se), 0.19);
    }

    #[test]
    fn standard_table_fits_inside_the_default_radius() {
        let config = BondConfig::default();
        for &(a, b, length) in STANDARD_LENGTHS {
            assert!(length <= config.max_bond_length, "{a:?}-{b:?} = {length}");
            assert_eq!(config.resolve_length(a, b), length);
        }
    }

    #[test]
    fn pair_table_parses_labels_in_either_order() {
        let table = BondLengthTable::from_pairs([("N-C", 0.16), ("o - h", 0.1)]).unwrap();
        assert_eq!(table.get(Element::C, Element::N), Some(0.16));
        assert_eq!(table.get(Element::H, Element::O), Some(0.1));

        assert!(matches!(
            BondLengthTable::from_pairs([("CN", 0.16)]),
            Err(BondTableError::MalformedPair { .. })
        ));
        assert!(matches!(
            BondLengthTable::from_pairs([("C-Xx", 0.16)]),
            Err(BondTableError::UnknownElement { .. })
        ));
        assert!(matches!(
            BondLengthTable::from_pairs([("C-C", -1.0)]),
            Err(BondTableError::InvalidLength { .. })
        ));
    }

    #[test]
    fn csv_table_loads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "element_a,element_b,max_length").unwrap();
        writeln!(file, "C, S, 0.185").unwrap();
        writeln!(file, "Zn,N,0.23").unwrap();
        let table = BondLengthTable::load_csv(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(Element::S, Element::C), Some(0.185));
        assert_eq!(table.get(Element::N, Element::Zn), Some(0.23));
    }

    #[test]
    fn builder_fills_defaults_and_validates() {
        let config = CoreConfigBuilder::new().processor_cores(4).build().unwrap();
        assert_eq!(config.processor_cores, 4);
        assert_eq!(config.bonds, BondConfig::default());
        assert_eq!(config.classifier.executable, PathBuf::from("stride"));

        let err = CoreConfigBuilder::new().max_bonds_per_atom(0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "max_bonds_per_atom",
                ..
            }
        ));
        assert!(CoreConfigBuilder::new().processor_cores(0).build().is_err());
    }
}
