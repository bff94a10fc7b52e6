use std::collections::BTreeMap;
use std::fmt;

/// The eight per-residue categories reported by the secondary-structure classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecondaryStructureType {
    AlphaHelix,
    ThreeTenHelix,
    PiHelix,
    BetaSheet,
    BetaBridge,
    IsolatedBridge,
    Turn,
    #[default]
    Coil,
}

impl SecondaryStructureType {
    /// Maps a one-letter classifier code. Unknown codes are coil.
    pub fn from_code(code: char) -> Self {
        match code {
            'H' => Self::AlphaHelix,
            'G' => Self::ThreeTenHelix,
            'I' => Self::PiHelix,
            'E' => Self::BetaSheet,
            'B' => Self::BetaBridge,
            'b' => Self::IsolatedBridge,
            'T' => Self::Turn,
            _ => Self::Coil,
        }
    }

    pub fn code(&self) -> char {
        match self {
            Self::AlphaHelix => 'H',
            Self::ThreeTenHelix => 'G',
            Self::PiHelix => 'I',
            Self::BetaSheet => 'E',
            Self::BetaBridge => 'B',
            Self::IsolatedBridge => 'b',
            Self::Turn => 'T',
            Self::Coil => 'C',
        }
    }

    pub fn is_helix(&self) -> bool {
        matches!(self, Self::AlphaHelix | Self::ThreeTenHelix | Self::PiHelix)
    }

    pub fn is_strand(&self) -> bool {
        matches!(self, Self::BetaSheet | Self::BetaBridge | Self::IsolatedBridge)
    }
}

impl fmt::Display for SecondaryStructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::AlphaHelix => "AlphaHelix",
                Self::ThreeTenHelix => "310Helix",
                Self::PiHelix => "PiHelix",
                Self::BetaSheet => "BetaSheet",
                Self::BetaBridge => "BetaBridge",
                Self::IsolatedBridge => "IsolatedBridge",
                Self::Turn => "Turn",
                Self::Coil => "Coil",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondaryStructureInfo {
    pub structure_type: SecondaryStructureType,
    pub phi: f32, // Degrees
    pub psi: f32, // Degrees
}

/// Per-residue classification of one conformation, keyed by residue index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecondaryStructure {
    residues: BTreeMap<usize, SecondaryStructureInfo>,
}

impl SecondaryStructure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, residue_index: usize, info: SecondaryStructureInfo) {
        self.residues.insert(residue_index, info);
    }

    pub fn get(&self, residue_index: usize) -> Option<&SecondaryStructureInfo> {
        self.residues.get(&residue_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SecondaryStructureInfo)> {
        self.residues.iter().map(|(&i, info)| (i, info))
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Number of residues per category.
    pub fn counts(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for info in self.residues.values() {
            *counts.entry(info.structure_type.code()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_categories_and_back() {
        for code in ['H', 'G', 'I', 'E', 'B', 'b', 'T', 'C'] {
            assert_eq!(SecondaryStructureType::from_code(code).code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_coil() {
        assert_eq!(
            SecondaryStructureType::from_code('X'),
            SecondaryStructureType::Coil
        );
        assert_eq!(
            SecondaryStructureType::from_code(' '),
            SecondaryStructureType::Coil
        );
    }

    #[test]
    fn counts_group_by_code() {
        let mut ss = SecondaryStructure::new();
        let helix = SecondaryStructureInfo {
            structure_type: SecondaryStructureType::AlphaHelix,
            phi: -57.0,
            psi: -47.0,
        };
        ss.insert(1, helix);
        ss.insert(2, helix);
        ss.insert(
            3,
            SecondaryStructureInfo {
                structure_type: SecondaryStructureType::Coil,
                ..helix
            },
        );
        let counts = ss.counts();
        assert_eq!(counts[&'H'], 2);
        assert_eq!(counts[&'C'], 1);
        assert!(ss.get(1).unwrap().structure_type.is_helix());
    }
}
