use std::fmt;

/// An unordered pair of atom indices.
///
/// The pair is canonicalized on construction so the lower index is always stored first;
/// derived equality, ordering and hashing therefore treat a bond and its reverse as the
/// same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    atom_a: usize, // Lower atom index
    atom_b: usize, // Higher atom index
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize) -> Self {
        Self {
            atom_a: atom1.min(atom2),
            atom_b: atom1.max(atom2),
        }
    }

    pub fn atom_a(&self) -> usize {
        self.atom_a
    }

    pub fn atom_b(&self) -> usize {
        self.atom_b
    }

    pub fn contains(&self, atom_index: usize) -> bool {
        self.atom_a == atom_index || self.atom_b == atom_index
    }

    /// The atom on the other end of the bond, if `atom_index` is one of its ends.
    pub fn partner(&self, atom_index: usize) -> Option<usize> {
        if atom_index == self.atom_a {
            Some(self.atom_b)
        } else if atom_index == self.atom_b {
            Some(self.atom_a)
        } else {
            None
        }
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.atom_a, self.atom_b)
    }
}
