use super::atom::Atom;
use super::bounding_box::BoundingBox;
use super::chain::Chain;
use super::residue::Residue;
use super::structure::PrimaryStructure;
use crate::core::tables::elements::{Element, element_from_atom_name};
use crate::core::tables::residues::StandardResidue;
use nalgebra::Point3;

/// Letter identifier for the n-th chain of a file that carries no chain ids (`A`..`Z`, cycling).
pub fn chain_letter(ordinal: usize) -> String {
    char::from(b'A' + (ordinal % 26) as u8).to_string()
}

#[derive(Debug, Clone)]
struct CurrentResidue {
    index: usize,
    id: i32,
    name: String,
    residue_type: StandardResidue,
}

/// Incremental constructor used by the format readers.
///
/// Indices are assigned monotonically: atoms from 0, residues from 1, chains from 0.
/// Atoms added before any residue is started are stored as free atoms with no parent.
pub struct StructureBuilder {
    structure: PrimaryStructure,
    next_atom: usize,
    next_residue: usize,
    next_chain: usize,
    current_chain: Option<(usize, String)>,
    current_residue: Option<CurrentResidue>,
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new("")
    }
}

impl StructureBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            structure: PrimaryStructure::new(title),
            next_atom: 0,
            next_residue: 1,
            next_chain: 0,
            current_chain: None,
            current_residue: None,
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.structure.title = title.to_string();
        self
    }

    pub fn set_time(&mut self, time: Option<f32>) -> &mut Self {
        self.structure.time = time;
        self
    }

    pub fn set_bounding_box(&mut self, bounding_box: Option<BoundingBox>) -> &mut Self {
        self.structure.bounding_box = bounding_box;
        self
    }

    /// Opens a new chain; subsequent residues are attached to it.
    pub fn start_chain(&mut self, id: &str) -> usize {
        let index = self.next_chain;
        self.next_chain += 1;
        self.structure.add_chain(Chain::new(index, id));
        self.current_chain = Some((index, id.trim().to_string()));
        self.current_residue = None;
        index
    }

    /// Opens a new residue in the current chain, opening chain `A` first if none is open.
    pub fn start_residue(&mut self, id: i32, name: &str) -> usize {
        let chain_index = match &self.current_chain {
            Some((index, _)) => *index,
            None => {
                let ordinal = self.next_chain;
                self.start_chain(&chain_letter(ordinal))
            }
        };
        let index = self.next_residue;
        self.next_residue += 1;
        let residue = Residue::new(index, id, name);
        self.current_residue = Some(CurrentResidue {
            index,
            id,
            name: residue.name.clone(),
            residue_type: residue.residue_type,
        });
        self.structure.add_residue(chain_index, residue);
        index
    }

    /// Adds an atom to the current residue (or as a free atom when none is open).
    ///
    /// When `element` is `None` it is inferred from the atom name and the residue type.
    /// Atoms of non-standard residues are flagged as heteroatoms in addition to `het_atom`.
    pub fn add_atom(
        &mut self,
        id: i32,
        name: &str,
        element: Option<Element>,
        position: Point3<f32>,
        het_atom: bool,
    ) -> usize {
        let index = self.next_atom;
        self.next_atom += 1;

        let residue_type = self
            .current_residue
            .as_ref()
            .map_or(StandardResidue::None, |r| r.residue_type);
        let element = element.unwrap_or_else(|| element_from_atom_name(name, residue_type));

        let mut atom = Atom::new(index, id, name, element, position);
        if let Some(residue) = &self.current_residue {
            atom.residue_index = residue.index;
            atom.residue_id = residue.id;
            atom.residue_name = residue.name.clone();
            atom.residue_type = residue.residue_type;
            atom.het_atom = het_atom || !residue.residue_type.is_standard();
        } else {
            atom.het_atom = het_atom;
        }
        if let Some((_, chain_id)) = &self.current_chain {
            atom.chain_id = chain_id.clone();
        }

        self.structure.add_atom(atom);
        index
    }

    /// Closes the current chain so the next residue starts a new one.
    pub fn end_chain(&mut self) -> &mut Self {
        self.current_chain = None;
        self.current_residue = None;
        self
    }

    pub fn chain_count(&self) -> usize {
        self.next_chain
    }

    pub fn build(self) -> PrimaryStructure {
        self.structure
    }
}
