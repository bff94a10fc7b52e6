use super::residue::Residue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub index: usize,                         // Unique within a structure
    pub id: String,                           // Source-assigned identifier, may repeat
    pub(crate) residues: Vec<usize>,          // Ordered residue indices
    pub(crate) main_chain_residues: Vec<usize>, // Amino acids with N, CA and C present
    pub(crate) main_chain_atoms: Vec<usize>,  // N, CA, C of each main-chain residue
}

impl Chain {
    pub fn new(index: usize, id: &str) -> Self {
        Self {
            index,
            id: id.trim().to_string(),
            residues: Vec::new(),
            main_chain_residues: Vec::new(),
            main_chain_atoms: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[usize] {
        &self.residues
    }

    pub fn main_chain_residues(&self) -> &[usize] {
        &self.main_chain_residues
    }

    pub fn main_chain_atoms(&self) -> &[usize] {
        &self.main_chain_atoms
    }

    pub(crate) fn push_residue(&mut self, residue_index: usize) -> bool {
        if self.residues.contains(&residue_index) {
            return false;
        }
        self.residues.push(residue_index);
        true
    }

    /// Records a residue that just gained a complete main chain.
    ///
    /// Residues normally complete in chain order, in which case the derived lists are
    /// simply extended; anything else triggers a full rebuild.
    pub(crate) fn note_main_chain_residue(
        &mut self,
        residue: &Residue,
        residues: &BTreeMap<usize, Residue>,
    ) {
        let Some(atoms) = residue.main_chain_atoms() else {
            return;
        };
        let in_order = match self.main_chain_residues.last() {
            None => true,
            Some(&last) => self.position_of(last) < self.position_of(residue.index),
        };
        if in_order {
            self.main_chain_residues.push(residue.index);
            self.main_chain_atoms.extend_from_slice(&atoms);
        } else {
            self.rebuild_main_chain(residues);
        }
    }

    pub(crate) fn rebuild_main_chain(&mut self, residues: &BTreeMap<usize, Residue>) {
        self.main_chain_residues.clear();
        self.main_chain_atoms.clear();
        for residue_index in &self.residues {
            if let Some(atoms) = residues
                .get(residue_index)
                .and_then(|residue| residue.main_chain_atoms())
            {
                self.main_chain_residues.push(*residue_index);
                self.main_chain_atoms.extend_from_slice(&atoms);
            }
        }
    }

    fn position_of(&self, residue_index: usize) -> Option<usize> {
        self.residues.iter().position(|&r| r == residue_index)
    }
}
