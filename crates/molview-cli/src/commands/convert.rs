use super::load_single_frame;
use crate::cli::ConvertArgs;
use crate::error::Result;
use molview::workflows::load::{load_structure, save_structure};
use tracing::info;

pub fn run(args: ConvertArgs) -> Result<()> {
    info!("Loading structure from {:?}", &args.structure);
    let structure = load_structure(&args.structure)?;

    let trajectory = match &args.frame.trajectory {
        Some(path) => Some(load_single_frame(
            path,
            args.frame.frame,
            structure.atom_count(),
        )?),
        None => None,
    };
    let frame = trajectory.as_ref().and_then(|t| t.frame(0));

    save_structure(&structure, frame, &args.output)?;
    println!("Structure written to {}", args.output.display());
    Ok(())
}
