use crate::cli::BondsArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::ProgressDisplay;
use molview::core::models::bond::Bond;
use molview::engine::bonds::infer_structure_bonds;
use molview::engine::config::CoreConfig;
use molview::engine::progress::ProgressReporter;
use molview::workflows::load::load_structure;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct BondRecord {
    id: usize,
    atom_a: usize,
    atom_b: usize,
}

pub fn run(args: BondsArgs, config: &CoreConfig) -> Result<()> {
    info!("Loading structure from {:?}", &args.structure);
    let structure = load_structure(&args.structure)?;

    let display = ProgressDisplay::stderr();
    let reporter = ProgressReporter::with_callback(display.callback());

    println!(
        "Inferring bonds for {} atoms on {} worker(s)...",
        structure.atom_count(),
        config.processor_cores
    );
    let bonds = infer_structure_bonds(
        &structure,
        &config.bonds,
        config.processor_cores,
        &reporter,
    )?;
    println!("Found {} bonds.", bonds.len());

    if let Some(output) = &args.output {
        write_csv(&bonds, output)?;
        println!("Bonds written to {}", output.display());
    }
    Ok(())
}

fn write_csv(bonds: &BTreeMap<usize, Bond>, path: &Path) -> Result<()> {
    let to_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_error)?;
    for (&id, bond) in bonds {
        writer
            .serialize(BondRecord {
                id,
                atom_a: bond.atom_a(),
                atom_b: bond.atom_b(),
            })
            .map_err(to_error)?;
    }
    writer.flush()?;
    Ok(())
}
