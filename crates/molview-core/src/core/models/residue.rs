use crate::core::tables::residues::{BackboneAtom, StandardResidue, backbone_atom, classify_residue};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub index: usize,                      // Unique, sequential, 1-based
    pub id: i32,                           // Residue number from the source file
    pub name: String,                      // Upper-cased, trimmed (e.g. "ALA", "SOL")
    pub residue_type: StandardResidue,     // Derived from the name
    pub(crate) chain_index: Option<usize>, // Owning chain, set when added to a structure
    pub(crate) atoms: BTreeSet<usize>,     // Atom indices, ordered
    amine_nitrogen: Option<usize>,
    alpha_carbon: Option<usize>,
    carbonyl_carbon: Option<usize>,
    carbonyl_oxygen: Option<usize>,
}

impl Residue {
    pub fn new(index: usize, id: i32, name: &str) -> Self {
        let name = name.trim().to_ascii_uppercase();
        let residue_type = classify_residue(&name);
        Self {
            index,
            id,
            name,
            residue_type,
            chain_index: None,
            atoms: BTreeSet::new(),
            amine_nitrogen: None,
            alpha_carbon: None,
            carbonyl_carbon: None,
            carbonyl_oxygen: None,
        }
    }

    /// Registers an atom with this residue and records it as a backbone atom when its
    /// name is recognized. Only the first atom seen for each backbone role is kept.
    ///
    /// Returns `false` if the atom index was already registered.
    pub(crate) fn add_atom(&mut self, atom_index: usize, atom_name: &str) -> bool {
        if !self.atoms.insert(atom_index) {
            return false;
        }
        if self.residue_type != StandardResidue::AminoAcid {
            return true;
        }
        let slot = match backbone_atom(atom_name) {
            Some(BackboneAtom::AmineNitrogen) => &mut self.amine_nitrogen,
            Some(BackboneAtom::AlphaCarbon) => &mut self.alpha_carbon,
            Some(BackboneAtom::CarbonylCarbon) => &mut self.carbonyl_carbon,
            Some(BackboneAtom::CarbonylOxygen) => &mut self.carbonyl_oxygen,
            None => return true,
        };
        slot.get_or_insert(atom_index);
        true
    }

    pub fn atoms(&self) -> &BTreeSet<usize> {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn chain_index(&self) -> Option<usize> {
        self.chain_index
    }

    pub fn amine_nitrogen(&self) -> Option<usize> {
        self.amine_nitrogen
    }

    pub fn alpha_carbon(&self) -> Option<usize> {
        self.alpha_carbon
    }

    pub fn carbonyl_carbon(&self) -> Option<usize> {
        self.carbonyl_carbon
    }

    pub fn carbonyl_oxygen(&self) -> Option<usize> {
        self.carbonyl_oxygen
    }

    /// The N, CA and C atom indices, when all three are present.
    pub fn main_chain_atoms(&self) -> Option<[usize; 3]> {
        Some([
            self.amine_nitrogen?,
            self.alpha_carbon?,
            self.carbonyl_carbon?,
        ])
    }

    pub fn has_main_chain(&self) -> bool {
        self.main_chain_atoms().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_residue_normalizes_name_and_classifies_it() {
        let residue = Residue::new(1, 12, " ala ");
        assert_eq!(residue.name, "ALA");
        assert_eq!(residue.residue_type, StandardResidue::AminoAcid);
        assert!(residue.atoms().is_empty());
        assert!(residue.chain_index().is_none());
    }

    #[test]
    fn backbone_atoms_are_recorded_for_amino_acids() {
        let mut residue = Residue::new(1, 1, "GLY");
        residue.add_atom(10, "N");
        residue.add_atom(11, "CA");
        assert!(!residue.has_main_chain());
        residue.add_atom(12, "C");
        residue.add_atom(13, "O");
        assert_eq!(residue.main_chain_atoms(), Some([10, 11, 12]));
        assert_eq!(residue.carbonyl_oxygen(), Some(13));
    }

    #[test]
    fn first_backbone_atom_wins() {
        let mut residue = Residue::new(1, 1, "ALA");
        residue.add_atom(0, "CA");
        residue.add_atom(5, "CA");
        assert_eq!(residue.alpha_carbon(), Some(0));
        assert_eq!(residue.atom_count(), 2);
    }

    #[test]
    fn non_amino_acids_never_get_backbone_references() {
        let mut residue = Residue::new(2, 7, "SOL");
        residue.add_atom(0, "N");
        residue.add_atom(1, "CA");
        residue.add_atom(2, "C");
        assert!(residue.amine_nitrogen().is_none());
        assert!(!residue.has_main_chain());
    }

    #[test]
    fn duplicate_atoms_are_rejected() {
        let mut residue = Residue::new(1, 1, "SER");
        assert!(residue.add_atom(4, "OG"));
        assert!(!residue.add_atom(4, "OG"));
        assert_eq!(residue.atom_count(), 1);
    }
}
