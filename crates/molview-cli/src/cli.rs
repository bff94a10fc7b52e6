use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "molview CLI - Inspect molecular dynamics structures and trajectories: bond inference, secondary structure and format conversion.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads for bond inference.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a structure file: title, counts, chains, elements and residue names.
    Info(InfoArgs),
    /// Infer covalent bonds from interatomic distances.
    Bonds(BondsArgs),
    /// Assign secondary structure with an external STRIDE-compatible classifier.
    Secondary(SecondaryArgs),
    /// Load a trajectory (and optional colour file) against a structure and summarize it.
    Trajectory(TrajectoryArgs),
    /// Write a structure, optionally with one trajectory frame, as PDB or GRO.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Structure file (.gro, .pdb or .xyz).
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,
}

#[derive(Args, Debug)]
pub struct BondsArgs {
    /// Structure file (.gro, .pdb or .xyz).
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,

    /// Write the bonds as `id,atom_a,atom_b` CSV records.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the global maximum bond length (nm).
    #[arg(long, value_name = "NM")]
    pub max_length: Option<f32>,
}

/// Selects a single trajectory frame.
#[derive(Args, Debug, Clone)]
pub struct FrameArgs {
    /// Trajectory file (.dcd, .xtc or multi-frame .gro/.pos).
    #[arg(short, long, value_name = "PATH")]
    pub trajectory: Option<PathBuf>,

    /// Frame number (0-based) within the trajectory.
    #[arg(short, long, value_name = "INT", default_value_t = 0, requires = "trajectory")]
    pub frame: usize,
}

#[derive(Args, Debug)]
pub struct SecondaryArgs {
    /// Structure file (.gro, .pdb or .xyz).
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,

    #[command(flatten)]
    pub frame: FrameArgs,

    /// Classifier executable, overriding the config file.
    #[arg(long, value_name = "PATH")]
    pub classifier: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TrajectoryArgs {
    /// Structure file (.gro, .pdb or .xyz).
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,

    /// Trajectory file (.dcd, .xtc or multi-frame .gro/.pos).
    #[arg(required = true, value_name = "TRAJECTORY")]
    pub trajectory: PathBuf,

    /// Number of frames to skip before reading.
    #[arg(long, value_name = "INT", default_value_t = 0)]
    pub start: usize,

    /// Maximum number of frames to read.
    #[arg(long, value_name = "INT")]
    pub count: Option<usize>,

    /// Read every Nth frame.
    #[arg(long, value_name = "INT", default_value_t = 1)]
    pub frequency: usize,

    /// Per-atom colour file applied to the loaded frames.
    #[arg(long, value_name = "PATH")]
    pub colours: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Structure file (.gro, .pdb or .xyz).
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,

    /// Output file; the format follows the extension (.pdb or .gro).
    #[arg(required = true, value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub frame: FrameArgs,
}
