use super::residues::StandardResidue;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A chemical element as far as structure ingestion cares about it.
///
/// Only elements commonly found in biomolecular simulations are modelled explicitly;
/// everything else collapses into [`Element::Other`], which carries generic radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Element {
    H,
    C,
    N,
    O,
    F,
    Na,
    Mg,
    P,
    S,
    Cl,
    K,
    Ca,
    Mn,
    Fe,
    Cu,
    Zn,
    Se,
    Br,
    I,
    #[default]
    Other,
}

#[rustfmt::skip]
static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "H"  => Element::H,  "D"  => Element::H,
    "C"  => Element::C,  "N"  => Element::N,  "O"  => Element::O,  "F"  => Element::F,
    "NA" => Element::Na, "MG" => Element::Mg, "P"  => Element::P,  "S"  => Element::S,
    "CL" => Element::Cl, "K"  => Element::K,  "CA" => Element::Ca, "MN" => Element::Mn,
    "FE" => Element::Fe, "CU" => Element::Cu, "ZN" => Element::Zn, "SE" => Element::Se,
    "BR" => Element::Br, "I"  => Element::I,
};

// Force-field specific ion residue/atom names that do not start with the element symbol.
#[rustfmt::skip]
static ION_NAMES: Map<&'static str, Element> = phf_map! {
    "SOD" => Element::Na, "NA+" => Element::Na,
    "CLA" => Element::Cl, "CL-" => Element::Cl,
    "POT" => Element::K,  "K+"  => Element::K,
    "CAL" => Element::Ca, "MG2" => Element::Mg, "ZN2" => Element::Zn,
};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl Element {
    /// Looks up an element by its symbol, ignoring case and surrounding whitespace.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        ELEMENT_SYMBOLS
            .get(symbol.trim().to_ascii_uppercase().as_str())
            .copied()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::I => "I",
            Element::Other => "X",
        }
    }

    /// Covalent radius in nanometres.
    pub fn atomic_radius(self) -> f32 {
        match self {
            Element::H => 0.031,
            Element::C => 0.076,
            Element::N => 0.071,
            Element::O => 0.066,
            Element::F => 0.057,
            Element::Na => 0.166,
            Element::Mg => 0.141,
            Element::P => 0.107,
            Element::S => 0.105,
            Element::Cl => 0.102,
            Element::K => 0.203,
            Element::Ca => 0.176,
            Element::Mn => 0.139,
            Element::Fe => 0.132,
            Element::Cu => 0.132,
            Element::Zn => 0.122,
            Element::Se => 0.120,
            Element::Br => 0.120,
            Element::I => 0.139,
            Element::Other => 0.150,
        }
    }

    /// Van der Waals radius in nanometres.
    pub fn van_der_waals_radius(self) -> f32 {
        match self {
            Element::H => 0.120,
            Element::C => 0.170,
            Element::N => 0.155,
            Element::O => 0.152,
            Element::F => 0.147,
            Element::Na => 0.227,
            Element::Mg => 0.173,
            Element::P => 0.180,
            Element::S => 0.180,
            Element::Cl => 0.175,
            Element::K => 0.275,
            Element::Ca => 0.231,
            Element::Mn => 0.197,
            Element::Fe => 0.194,
            Element::Cu => 0.140,
            Element::Zn => 0.139,
            Element::Se => 0.190,
            Element::Br => 0.185,
            Element::I => 0.198,
            Element::Other => 0.180,
        }
    }

    pub fn is_hydrogen(self) -> bool {
        self == Element::H
    }
}

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s).ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Infers the element of an atom from its name.
///
/// Atoms of standard residues (amino acids, nucleotides) only ever contain single-letter
/// elements, so the first letter decides: `CA` is an alpha carbon there, not calcium.
/// For everything else a name that is exactly a two-letter symbol (`CL`, `NA`, `ZN`) or a
/// known ion alias wins; otherwise the first letter is used (`OW` -> O, `HW1` -> H).
///
/// # Arguments
///
/// * `atom_name` - The atom name as it appears in the file.
/// * `residue_type` - The standard category of the owning residue.
///
/// # Return
///
/// The inferred element, or [`Element::Other`] when nothing matches.
pub fn element_from_atom_name(atom_name: &str, residue_type: StandardResidue) -> Element {
    let upper = atom_name.trim().to_ascii_uppercase();
    let name = upper.trim_start_matches(|c: char| c.is_ascii_digit());
    if name.is_empty() {
        return Element::Other;
    }

    if residue_type == StandardResidue::None {
        if let Some(&element) = ION_NAMES.get(name) {
            return element;
        }
        if name.len() == 2 && name.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Some(element) = Element::from_symbol(name) {
                return element;
            }
        }
    }

    name.chars()
        .next()
        .and_then(|c| Element::from_symbol(&c.to_string()))
        .unwrap_or(Element::Other)
}
