use crate::cli::InfoArgs;
use crate::error::Result;
use itertools::Itertools;
use molview::core::models::structure::PrimaryStructure;
use molview::workflows::load::load_structure;
use std::fmt;
use tracing::info;

pub fn run(args: InfoArgs) -> Result<()> {
    info!("Loading structure from {:?}", &args.structure);
    let structure = load_structure(&args.structure)?;
    print!("{}", StructureSummary(&structure));
    Ok(())
}

struct StructureSummary<'a>(&'a PrimaryStructure);

impl fmt::Display for StructureSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let structure = self.0;
        let title = if structure.title.is_empty() {
            "(untitled)"
        } else {
            &structure.title
        };
        writeln!(f, "Title:    {title}")?;
        if let Some(time) = structure.time {
            writeln!(f, "Time:     {time} ps")?;
        }
        if let Some(cell) = structure.bounding_box {
            let l = cell.lengths();
            writeln!(f, "Box:      {:.3} x {:.3} x {:.3} nm", l.x, l.y, l.z)?;
        }
        writeln!(
            f,
            "Atoms:    {}\nResidues: {}\nChains:   {}",
            structure.atom_count(),
            structure.residue_count(),
            structure.chains().len()
        )?;
        for chain in structure.chains() {
            writeln!(
                f,
                "  chain {:<3} {:<10} {:>6} residues {:>6} main-chain",
                chain.id,
                structure.chain_residue_type(chain).to_string(),
                chain.residues().len(),
                chain.main_chain_residues().len()
            )?;
        }
        writeln!(f, "Elements: {}", structure.element_names().iter().join(", "))?;
        writeln!(
            f,
            "Residue names: {}",
            structure.residue_names().iter().join(", ")
        )
    }
}
