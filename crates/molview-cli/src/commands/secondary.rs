use super::load_single_frame;
use crate::cli::SecondaryArgs;
use crate::error::Result;
use molview::core::models::secondary::SecondaryStructure;
use molview::core::models::structure::PrimaryStructure;
use molview::engine::config::CoreConfig;
use molview::engine::secondary::{SecondaryStructureTrajectory, StrideClassifier};
use molview::workflows::load::load_structure;
use std::fmt;
use tracing::info;

pub fn run(args: SecondaryArgs, config: &CoreConfig) -> Result<()> {
    info!("Loading structure from {:?}", &args.structure);
    let structure = load_structure(&args.structure)?;
    let classifier = StrideClassifier::from_config(&config.classifier);
    info!("Using classifier {:?}", classifier.executable());

    let table = match &args.frame.trajectory {
        None => {
            let result = SecondaryStructure::generate(&structure, &classifier)?;
            ResidueTable {
                structure: &structure,
                result: &result,
            }
            .to_string()
        }
        Some(path) => {
            let trajectory = load_single_frame(path, args.frame.frame, structure.atom_count())?;
            let mut frames = SecondaryStructureTrajectory::new(&structure, &trajectory, classifier);
            let result = frames.frame(0)?;
            ResidueTable {
                structure: &structure,
                result,
            }
            .to_string()
        }
    };
    print!("{table}");
    Ok(())
}

/// Per-residue assignments followed by a one-line count of each structure code.
struct ResidueTable<'a> {
    structure: &'a PrimaryStructure,
    result: &'a SecondaryStructure,
}

impl fmt::Display for ResidueTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>7} {:>6} {:<5} {:<5} {:<15} {:>8} {:>8}",
            "index", "id", "name", "chain", "structure", "phi", "psi"
        )?;
        for (index, info) in self.result.iter() {
            let residue = self.structure.residue(index);
            let chain = residue
                .and_then(|r| r.chain_index())
                .and_then(|c| self.structure.chain(c))
                .map_or("-", |c| c.id.as_str());
            writeln!(
                f,
                "{:>7} {:>6} {:<5} {:<5} {:<15} {:>8.2} {:>8.2}",
                index,
                residue.map_or(0, |r| r.id),
                residue.map_or("?", |r| r.name.as_str()),
                chain,
                info.structure_type.to_string(),
                info.phi,
                info.psi
            )?;
        }
        let counts = self
            .result
            .counts()
            .into_iter()
            .map(|(code, n)| format!("{code}:{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "{} residues assigned ({counts})", self.result.len())
    }
}
