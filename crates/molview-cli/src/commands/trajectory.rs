use crate::cli::TrajectoryArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::ProgressDisplay;
use molview::core::io::traits::FrameSelection;
use molview::core::models::frame::PrimaryStructureTrajectory;
use molview::engine::config::CoreConfig;
use molview::engine::progress::ProgressReporter;
use molview::workflows::load::{LoadOptions, load};
use std::fmt;

pub fn run(args: TrajectoryArgs, config: &CoreConfig) -> Result<()> {
    if args.frequency == 0 {
        return Err(CliError::Argument(
            "--frequency must be at least 1".to_string(),
        ));
    }
    let options = LoadOptions {
        trajectory: Some(args.trajectory),
        colours: args.colours,
        selection: FrameSelection::new(args.start, args.count, args.frequency),
        colour_default: config.colour_default,
    };

    let display = ProgressDisplay::stderr();
    let reporter = ProgressReporter::with_callback(display.callback());
    let system = load(&args.structure, &options, &reporter)?;

    println!(
        "Structure: {} atoms, {} residues, {} chains",
        system.structure.atom_count(),
        system.structure.residue_count(),
        system.structure.chains().len()
    );
    match &system.trajectory {
        Some(trajectory) => print!("{}", TrajectorySummary(trajectory)),
        None => println!("No frames loaded."),
    }
    Ok(())
}

struct TrajectorySummary<'a>(&'a PrimaryStructureTrajectory);

fn describe(step: Option<i32>, time: Option<f32>) -> String {
    let step = step.map_or("-".to_string(), |s| s.to_string());
    let time = time.map_or("-".to_string(), |t| format!("{t} ps"));
    format!("step {step}, time {time}")
}

impl fmt::Display for TrajectorySummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames = self.0.frames();
        writeln!(f, "Frames:   {}", frames.len())?;
        if let (Some(first), Some(last)) = (frames.first(), frames.last()) {
            writeln!(f, "First:    {}", describe(first.step, first.time))?;
            writeln!(f, "Last:     {}", describe(last.step, last.time))?;
        }
        let coloured = frames.iter().filter(|frame| frame.colours.is_some()).count();
        if coloured > 0 {
            writeln!(f, "Coloured: {coloured} frame(s)")?;
        }
        Ok(())
    }
}
