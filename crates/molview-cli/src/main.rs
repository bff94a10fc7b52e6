mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::{CliOverrides, build_config};
use crate::error::{CliError, Result};
use crate::logging::LogSettings;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    LogSettings::from_flags(cli.verbose, cli.quiet, cli.log_file.clone()).install()?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("🚀 molview CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let overrides = overrides_for(&cli);
    let config = build_config(cli.config.as_deref(), &overrides)?;

    let command_result = match cli.command {
        Commands::Info(args) => {
            info!("Dispatching to 'info' command.");
            commands::info::run(args)
        }
        Commands::Bonds(args) => {
            info!("Dispatching to 'bonds' command.");
            commands::bonds::run(args, &config)
        }
        Commands::Secondary(args) => {
            info!("Dispatching to 'secondary' command.");
            commands::secondary::run(args, &config)
        }
        Commands::Trajectory(args) => {
            info!("Dispatching to 'trajectory' command.");
            commands::trajectory::run(args, &config)
        }
        Commands::Convert(args) => {
            info!("Dispatching to 'convert' command.");
            commands::convert::run(args)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}

fn overrides_for(cli: &Cli) -> CliOverrides {
    let mut overrides = CliOverrides {
        threads: cli.threads,
        ..CliOverrides::default()
    };
    match &cli.command {
        Commands::Bonds(args) => overrides.max_bond_length = args.max_length,
        Commands::Secondary(args) => overrides.classifier = args.classifier.clone(),
        _ => {}
    }
    overrides
}
