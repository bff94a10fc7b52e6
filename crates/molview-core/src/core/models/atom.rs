use crate::core::tables::elements::Element;
use crate::core::tables::residues::StandardResidue;
use nalgebra::Point3;

/// A single atom of a [`PrimaryStructure`](super::structure::PrimaryStructure).
///
/// Identity is carried by `index`, which is unique within a structure and assigned in parse
/// order. `id` is whatever serial the source file used and may repeat (GRO serials wrap at
/// 100000). The residue and chain fields are denormalized copies of the parent records,
/// written once by the parser that creates the atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Unique, 0-based insertion ordinal. Also the atom's slot in frame coordinate buffers.
    pub index: usize,
    /// Serial number from the source file.
    pub id: i32,
    /// Atom name (e.g. "CA", "OW").
    pub name: String,
    pub element: Element,
    /// Position in nanometres.
    pub position: Point3<f32>,
    /// Whether the atom came from a HETATM record or belongs to a non-standard residue.
    pub het_atom: bool,
    pub residue_index: usize,
    pub residue_id: i32,
    pub residue_name: String,
    pub residue_type: StandardResidue,
    pub chain_id: String,
}

impl Atom {
    /// Creates an atom that does not belong to any residue yet.
    ///
    /// Parent references start out empty (`residue_type` is `None`) and are filled in by
    /// the structure builder when the atom is attached to a residue.
    pub fn new(index: usize, id: i32, name: &str, element: Element, position: Point3<f32>) -> Self {
        Self {
            index,
            id,
            name: name.trim().to_string(),
            element,
            position,
            het_atom: false,
            residue_index: 0,
            residue_id: 0,
            residue_name: String::new(),
            residue_type: StandardResidue::None,
            chain_id: String::new(),
        }
    }

    pub fn atomic_radius(&self) -> f32 {
        self.element.atomic_radius()
    }

    pub fn van_der_waals_radius(&self) -> f32 {
        self.element.van_der_waals_radius()
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }

    pub fn distance_to(&self, other: &Atom) -> f32 {
        nalgebra::distance(&self.position, &other.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_empty_parent_references() {
        let atom = Atom::new(3, 4, " OW ", Element::O, Point3::new(0.1, 0.2, 0.3));
        assert_eq!(atom.index, 3);
        assert_eq!(atom.id, 4);
        assert_eq!(atom.name, "OW");
        assert_eq!(atom.residue_type, StandardResidue::None);
        assert!(atom.residue_name.is_empty());
        assert!(atom.chain_id.is_empty());
        assert!(!atom.het_atom);
    }

    #[test]
    fn radii_come_from_the_element_table() {
        let atom = Atom::new(0, 1, "X1", Element::Other, Point3::origin());
        assert_eq!(atom.atomic_radius(), Element::Other.atomic_radius());
        assert_eq!(
            atom.van_der_waals_radius(),
            Element::Other.van_der_waals_radius()
        );
    }

    #[test]
    fn distance_to_is_euclidean() {
        let a = Atom::new(0, 1, "O", Element::O, Point3::new(0.0, 0.0, 0.0));
        let b = Atom::new(1, 2, "H", Element::H, Point3::new(0.0, 0.3, 0.4));
        assert!((a.distance_to(&b) - 0.5).abs() < 1e-6);
        assert!(b.is_hydrogen());
    }
}
