use super::atom::Atom;
use super::bounding_box::BoundingBox;
use super::chain::Chain;
use super::residue::Residue;
use crate::core::tables::elements::Element;
use crate::core::tables::residues::StandardResidue;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

/// Criteria for [`PrimaryStructure::filter_atoms`].
///
/// Every criterion left as `None` matches all atoms; the supplied criteria are combined
/// with a logical AND. The two inclusion flags select atoms of standard residues (amino
/// acids, nucleotides) and of everything else independently.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomFilter {
    pub elements: Option<HashSet<Element>>,
    pub residue_names: Option<HashSet<String>>,
    pub residue_ids: Option<HashSet<i32>>,
    pub include_standard: bool,
    pub include_non_standard: bool,
}

impl Default for AtomFilter {
    fn default() -> Self {
        Self {
            elements: None,
            residue_names: None,
            residue_ids: None,
            include_standard: true,
            include_non_standard: true,
        }
    }
}

impl AtomFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.elements = Some(elements.into_iter().collect());
        self
    }

    pub fn residue_names<S: AsRef<str>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.residue_names = Some(
            names
                .into_iter()
                .map(|n| n.as_ref().trim().to_ascii_uppercase())
                .collect(),
        );
        self
    }

    pub fn residue_ids(mut self, ids: impl IntoIterator<Item = i32>) -> Self {
        self.residue_ids = Some(ids.into_iter().collect());
        self
    }

    pub fn include_standard(mut self, include: bool) -> Self {
        self.include_standard = include;
        self
    }

    pub fn include_non_standard(mut self, include: bool) -> Self {
        self.include_non_standard = include;
        self
    }

    pub fn matches(&self, atom: &Atom) -> bool {
        let standard_ok = if atom.residue_type.is_standard() {
            self.include_standard
        } else {
            self.include_non_standard
        };
        standard_ok
            && self
                .elements
                .as_ref()
                .is_none_or(|set| set.contains(&atom.element))
            && self
                .residue_names
                .as_ref()
                .is_none_or(|set| set.contains(&atom.residue_name))
            && self
                .residue_ids
                .as_ref()
                .is_none_or(|set| set.contains(&atom.residue_id))
    }
}

/// A structural snapshot: the atom/residue/chain composition plus one reference conformation.
///
/// This struct owns the authoritative collections of the model. Atoms are kept in insertion
/// order with an index lookup, residues in a map ordered by residue index and chains in
/// insertion order. All `add_*` operations are idempotent: inserting a record whose index
/// already exists leaves the structure untouched and returns `false`.
///
/// The unique element, residue-name and residue-id sets are computed lazily on first request
/// and invalidated by any successful mutation.
#[derive(Debug, Clone, Default)]
pub struct PrimaryStructure {
    /// Free-text title from the source file.
    pub title: String,
    /// Simulation time embedded in the source file, if any (ps).
    pub time: Option<f32>,
    /// Simulation box read from the source file, if any.
    pub bounding_box: Option<BoundingBox>,
    atoms: Vec<Atom>,
    atom_slots: HashMap<usize, usize>,
    residues: BTreeMap<usize, Residue>,
    chains: Vec<Chain>,
    element_names: OnceLock<BTreeSet<String>>,
    residue_names: OnceLock<BTreeSet<String>>,
    residue_ids: OnceLock<BTreeSet<i32>>,
}

impl PrimaryStructure {
    /// Creates an empty structure with the given title.
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Adds a chain unless a chain with the same index already exists.
    ///
    /// # Arguments
    ///
    /// * `chain` - The chain to add. Its residue lists are ignored; residues are attached
    ///   through [`add_residue`](Self::add_residue).
    ///
    /// # Return
    ///
    /// Returns `true` if the chain was inserted.
    pub fn add_chain(&mut self, chain: Chain) -> bool {
        if self.chain_slot(chain.index).is_some() {
            return false;
        }
        self.chains.push(Chain::new(chain.index, &chain.id));
        true
    }

    /// Adds a residue to an existing chain.
    ///
    /// # Arguments
    ///
    /// * `chain_index` - Index of the owning chain.
    /// * `residue` - The residue to add. Atoms are attached through [`add_atom`](Self::add_atom).
    ///
    /// # Return
    ///
    /// Returns `true` if the residue was inserted; `false` if its index is taken or the
    /// chain does not exist.
    pub fn add_residue(&mut self, chain_index: usize, mut residue: Residue) -> bool {
        if self.residues.contains_key(&residue.index) {
            return false;
        }
        let Some(slot) = self.chain_slot(chain_index) else {
            return false;
        };
        residue.chain_index = Some(chain_index);
        residue.atoms.clear();
        self.chains[slot].push_residue(residue.index);
        self.residues.insert(residue.index, residue);
        self.invalidate_caches();
        true
    }

    /// Adds an atom and links it into its residue when `atom.residue_index` names one.
    ///
    /// Atoms without a matching residue (e.g. from coordinate-only formats) are stored as
    /// free atoms. When the atom completes the main chain of an amino-acid residue, the
    /// owning chain's main-chain lists are updated.
    ///
    /// # Return
    ///
    /// Returns `true` if the atom was inserted, `false` if its index already exists.
    pub fn add_atom(&mut self, atom: Atom) -> bool {
        if self.atom_slots.contains_key(&atom.index) {
            return false;
        }

        if let Some(residue) = self.residues.get_mut(&atom.residue_index) {
            let had_main_chain = residue.has_main_chain();
            residue.add_atom(atom.index, &atom.name);
            if !had_main_chain && residue.has_main_chain() {
                if let Some(slot) = residue.chain_index.and_then(|c| self.chain_slot(c)) {
                    let residue = &self.residues[&atom.residue_index];
                    self.chains[slot].note_main_chain_residue(residue, &self.residues);
                }
            }
        }

        self.atom_slots.insert(atom.index, self.atoms.len());
        self.atoms.push(atom);
        self.invalidate_caches();
        true
    }

    fn chain_slot(&self, chain_index: usize) -> Option<usize> {
        self.chains.iter().position(|c| c.index == chain_index)
    }

    fn invalidate_caches(&mut self) {
        self.element_names = OnceLock::new();
        self.residue_names = OnceLock::new();
        self.residue_ids = OnceLock::new();
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atom_slots.get(&index).map(|&slot| &self.atoms[slot])
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Residues ordered by residue index.
    pub fn residues(&self) -> impl Iterator<Item = &Residue> {
        self.residues.values()
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(&index)
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn chain(&self, index: usize) -> Option<&Chain> {
        self.chain_slot(index).map(|slot| &self.chains[slot])
    }

    /// Atoms of a residue, ordered by atom index.
    pub fn residue_atoms<'a>(&'a self, residue: &'a Residue) -> impl Iterator<Item = &'a Atom> + 'a {
        residue.atoms().iter().filter_map(move |&i| self.atom(i))
    }

    /// The residue an atom belongs to, if any.
    pub fn residue_of(&self, atom: &Atom) -> Option<&Residue> {
        self.residues
            .get(&atom.residue_index)
            .filter(|r| r.atoms.contains(&atom.index))
    }

    /// The standard type shared by every residue of the chain, or `None` when mixed or empty.
    pub fn chain_residue_type(&self, chain: &Chain) -> StandardResidue {
        let mut types = chain
            .residues()
            .iter()
            .filter_map(|i| self.residues.get(i))
            .map(|r| r.residue_type);
        let Some(first) = types.next() else {
            return StandardResidue::None;
        };
        if types.all(|t| t == first) {
            first
        } else {
            StandardResidue::None
        }
    }

    /// Main-chain atoms (N, CA, C per complete amino acid) of all chains, in chain order.
    pub fn main_chain_atoms(&self) -> Vec<&Atom> {
        self.chains
            .iter()
            .flat_map(|c| c.main_chain_atoms().iter())
            .filter_map(|&i| self.atom(i))
            .collect()
    }

    /// Returns the atoms matching every supplied criterion of `filter`.
    pub fn filter_atoms(&self, filter: &AtomFilter) -> Vec<&Atom> {
        self.atoms.iter().filter(|a| filter.matches(a)).collect()
    }

    /// Groups atoms by element, preserving atom order inside each group.
    pub fn atoms_by_element(&self) -> BTreeMap<Element, Vec<&Atom>> {
        let mut groups: BTreeMap<Element, Vec<&Atom>> = BTreeMap::new();
        for atom in &self.atoms {
            groups.entry(atom.element).or_default().push(atom);
        }
        groups
    }

    /// Unique element symbols present in the structure.
    pub fn element_names(&self) -> &BTreeSet<String> {
        self.element_names.get_or_init(|| {
            self.atoms
                .iter()
                .map(|a| a.element.symbol().to_string())
                .collect()
        })
    }

    /// Unique residue names present in the structure.
    pub fn residue_names(&self) -> &BTreeSet<String> {
        self.residue_names
            .get_or_init(|| self.residues.values().map(|r| r.name.clone()).collect())
    }

    /// Unique source residue numbers present in the structure.
    pub fn residue_ids(&self) -> &BTreeSet<i32> {
        self.residue_ids
            .get_or_init(|| self.residues.values().map(|r| r.id).collect())
    }

    /// The first chain carrying the given identifier.
    pub fn chain_by_id(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn residues_by_name(&self, name: &str) -> Vec<&Residue> {
        let name = name.trim().to_ascii_uppercase();
        self.residues.values().filter(|r| r.name == name).collect()
    }

    /// The first residue (by index) carrying the given source residue number.
    pub fn residue_by_id(&self, id: i32) -> Option<&Residue> {
        self.residues.values().find(|r| r.id == id)
    }

    /// All residues whose source residue number is in `ids`, ordered by residue index.
    pub fn residues_by_ids(&self, ids: &[i32]) -> Vec<&Residue> {
        let wanted: HashSet<i32> = ids.iter().copied().collect();
        self.residues
            .values()
            .filter(|r| wanted.contains(&r.id))
            .collect()
    }

    /// Flat, interleaved x/y/z coordinate buffer of the reference conformation.
    pub fn coordinates(&self) -> Vec<f32> {
        self.atoms
            .iter()
            .flat_map(|a| [a.position.x, a.position.y, a.position.z])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn atom_in(residue: &Residue, index: usize, name: &str, element: Element) -> Atom {
        let mut atom = Atom::new(index, index as i32 + 1, name, element, Point3::origin());
        atom.residue_index = residue.index;
        atom.residue_id = residue.id;
        atom.residue_name = residue.name.clone();
        atom.residue_type = residue.residue_type;
        atom
    }

    fn peptide_with_water() -> PrimaryStructure {
        let mut structure = PrimaryStructure::new("test");
        structure.add_chain(Chain::new(0, "A"));
        structure.add_chain(Chain::new(1, "B"));

        let ala = Residue::new(1, 10, "ALA");
        let gly = Residue::new(2, 11, "GLY");
        let sol = Residue::new(3, 10, "SOL");
        structure.add_residue(0, ala.clone());
        structure.add_residue(0, gly.clone());
        structure.add_residue(1, sol.clone());

        let mut index = 0;
        for residue in [&ala, &gly] {
            for (name, element) in [
                ("N", Element::N),
                ("CA", Element::C),
                ("C", Element::C),
                ("O", Element::O),
            ] {
                structure.add_atom(atom_in(residue, index, name, element));
                index += 1;
            }
        }
        structure.add_atom(atom_in(&sol, index, "OW", Element::O));
        structure.add_atom(atom_in(&sol, index + 1, "HW1", Element::H));
        structure
    }

    #[test]
    fn duplicate_inserts_are_silently_ignored() {
        let mut structure = peptide_with_water();
        assert!(!structure.add_chain(Chain::new(0, "Z")));
        assert!(!structure.add_residue(0, Residue::new(1, 99, "LYS")));
        assert!(!structure.add_atom(Atom::new(0, 1, "X", Element::Other, Point3::origin())));
        assert_eq!(structure.atom_count(), 10);
        assert_eq!(structure.residue_count(), 3);
        assert_eq!(structure.chains().len(), 2);
        assert_eq!(structure.atom(0).unwrap().name, "N");
    }

    #[test]
    fn residue_into_missing_chain_is_rejected() {
        let mut structure = PrimaryStructure::new("t");
        assert!(!structure.add_residue(7, Residue::new(1, 1, "ALA")));
        assert_eq!(structure.residue_count(), 0);
    }

    #[test]
    fn main_chain_lists_follow_atom_insertion() {
        let structure = peptide_with_water();
        let chain = structure.chain_by_id("A").unwrap();
        assert_eq!(chain.main_chain_residues(), &[1, 2]);
        assert_eq!(chain.main_chain_atoms(), &[0, 1, 2, 4, 5, 6]);
        let names: Vec<_> = structure
            .main_chain_atoms()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["N", "CA", "C", "N", "CA", "C"]);
    }

    #[test]
    fn chain_residue_type_requires_uniform_residues() {
        let mut structure = peptide_with_water();
        let chain_a = structure.chain_by_id("A").unwrap().clone();
        assert_eq!(
            structure.chain_residue_type(&chain_a),
            StandardResidue::AminoAcid
        );
        structure.add_residue(0, Residue::new(4, 12, "HOH"));
        let chain_a = structure.chain_by_id("A").unwrap().clone();
        assert_eq!(structure.chain_residue_type(&chain_a), StandardResidue::None);
    }

    #[test]
    fn filter_combines_criteria_with_and() {
        let structure = peptide_with_water();

        let oxygens = structure.filter_atoms(&AtomFilter::new().elements([Element::O]));
        assert_eq!(oxygens.len(), 3);

        let gly_oxygen = structure.filter_atoms(
            &AtomFilter::new()
                .elements([Element::O])
                .residue_names(["gly"]),
        );
        assert_eq!(gly_oxygen.len(), 1);
        assert_eq!(gly_oxygen[0].index, 7);

        let by_id = structure.filter_atoms(&AtomFilter::new().residue_ids([10]));
        assert_eq!(by_id.len(), 6);
    }

    #[test]
    fn standard_flags_select_independently() {
        let structure = peptide_with_water();
        let non_standard =
            structure.filter_atoms(&AtomFilter::new().include_standard(false));
        assert_eq!(non_standard.len(), 2);
        let standard =
            structure.filter_atoms(&AtomFilter::new().include_non_standard(false));
        assert_eq!(standard.len(), 8);
        let nothing = structure.filter_atoms(
            &AtomFilter::new()
                .include_standard(false)
                .include_non_standard(false),
        );
        assert!(nothing.is_empty());
    }

    #[test]
    fn grouping_and_unique_sets() {
        let structure = peptide_with_water();
        let groups = structure.atoms_by_element();
        assert_eq!(groups[&Element::C].len(), 4);
        assert_eq!(groups[&Element::H].len(), 1);

        let elements: Vec<_> = structure.element_names().iter().cloned().collect();
        assert_eq!(elements, ["C", "H", "N", "O"]);
        let names: Vec<_> = structure.residue_names().iter().cloned().collect();
        assert_eq!(names, ["ALA", "GLY", "SOL"]);
        let ids: Vec<_> = structure.residue_ids().iter().copied().collect();
        assert_eq!(ids, [10, 11]);
    }

    #[test]
    fn cached_sets_are_refreshed_after_mutation() {
        let mut structure = peptide_with_water();
        assert!(!structure.element_names().contains("S"));
        structure.add_chain(Chain::new(2, "C"));
        let met = Residue::new(4, 50, "MET");
        structure.add_residue(2, met.clone());
        structure.add_atom(atom_in(&met, 100, "SD", Element::S));
        assert!(structure.element_names().contains("S"));
        assert!(structure.residue_ids().contains(&50));
    }

    #[test]
    fn residue_lookups() {
        let structure = peptide_with_water();
        assert_eq!(structure.residue_by_id(10).unwrap().name, "ALA");
        assert_eq!(structure.residues_by_name("sol").len(), 1);
        let both: Vec<_> = structure
            .residues_by_ids(&[10, 11])
            .iter()
            .map(|r| r.index)
            .collect();
        assert_eq!(both, [1, 2, 3]);
        assert!(structure.chain_by_id("Q").is_none());
    }

    #[test]
    fn residue_of_and_residue_atoms_are_consistent() {
        let structure = peptide_with_water();
        let water = structure.atom(9).unwrap();
        let residue = structure.residue_of(water).unwrap();
        assert_eq!(residue.name, "SOL");
        let names: Vec<_> = structure
            .residue_atoms(residue)
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, ["OW", "HW1"]);
        assert_eq!(structure.coordinates().len(), 30);
    }
}
