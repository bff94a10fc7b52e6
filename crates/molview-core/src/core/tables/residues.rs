use phf::{Map, Set, phf_map, phf_set};
use std::fmt;

/// The standard category a residue name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StandardResidue {
    AminoAcid,
    Dna,
    Rna,
    #[default]
    None,
}

impl StandardResidue {
    pub fn is_standard(self) -> bool {
        self != StandardResidue::None
    }
}

impl fmt::Display for StandardResidue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StandardResidue::AminoAcid => "AminoAcid",
                StandardResidue::Dna => "DNA",
                StandardResidue::Rna => "RNA",
                StandardResidue::None => "None",
            }
        )
    }
}

/// The four amino-acid backbone atoms tracked on every amino-acid residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackboneAtom {
    AmineNitrogen,
    AlphaCarbon,
    CarbonylCarbon,
    CarbonylOxygen,
}

#[rustfmt::skip]
static AMINO_ACIDS: Set<&'static str> = phf_set! {
    // --- Canonical ---
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    // --- Protonation states and force-field variants ---
    "ASH", "ASPH", "CYM", "CYX", "CYS2", "GLH", "GLUH", "LYN", "LYSH",
    "HID", "HIE", "HIP", "HSD", "HSE", "HSP", "HISA", "HISB", "HISD", "HISE", "HISH",
    // --- Non-canonical but backbone complete ---
    "MSE", "SEC", "PYL",
};

#[rustfmt::skip]
static DNA_NUCLEOTIDES: Set<&'static str> = phf_set! {
    "DA", "DC", "DG", "DT", "DU",
    "DA5", "DC5", "DG5", "DT5", "DA3", "DC3", "DG3", "DT3", "DAN", "DCN", "DGN", "DTN",
};

#[rustfmt::skip]
static RNA_NUCLEOTIDES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "I",
    "RA", "RC", "RG", "RU",
    "RA5", "RC5", "RG5", "RU5", "RA3", "RC3", "RG3", "RU3", "RAN", "RCN", "RGN", "RUN",
    "ADE", "CYT", "GUA", "URA",
};

#[rustfmt::skip]
static BACKBONE_ATOM_NAMES: Map<&'static str, BackboneAtom> = phf_map! {
    "N"   => BackboneAtom::AmineNitrogen,
    "CA"  => BackboneAtom::AlphaCarbon,
    "C"   => BackboneAtom::CarbonylCarbon,
    "O"   => BackboneAtom::CarbonylOxygen,
    // C-terminal carboxylate oxygens stand in for the carbonyl oxygen.
    "OC1" => BackboneAtom::CarbonylOxygen,
    "OT1" => BackboneAtom::CarbonylOxygen,
    "O1"  => BackboneAtom::CarbonylOxygen,
};

/// Classifies a residue name into its standard category.
///
/// The lookup is case-insensitive and ignores surrounding whitespace; unknown
/// names (ligands, water, ions) classify as [`StandardResidue::None`].
pub fn classify_residue(name: &str) -> StandardResidue {
    let key = name.trim().to_ascii_uppercase();
    if AMINO_ACIDS.contains(key.as_str()) {
        StandardResidue::AminoAcid
    } else if DNA_NUCLEOTIDES.contains(key.as_str()) {
        StandardResidue::Dna
    } else if RNA_NUCLEOTIDES.contains(key.as_str()) {
        StandardResidue::Rna
    } else {
        StandardResidue::None
    }
}

/// Returns the backbone role of an amino-acid atom name, if any.
pub fn backbone_atom(atom_name: &str) -> Option<BackboneAtom> {
    BACKBONE_ATOM_NAMES
        .get(atom_name.trim().to_ascii_uppercase().as_str())
        .copied()
}
