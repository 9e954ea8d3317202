//! `strata`: inspect and edit a world directory from the command line.
//!
//! Run with: `cargo run -p strata-cli -- --world ./world info`

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use strata_config::{CliArgs, Config};
use strata_world::RegionStore;
use tracing::{error, info};

const APP_NAME: &str = "strata";

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("{e}; continuing with default settings");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config
        .debug
        .log_dir
        .clone()
        .unwrap_or_else(|| config_dir.join("logs"));
    strata_log::init_logging(Some(&log_dir), config.debug.log_to_file, Some(&config));

    let store = match RegionStore::open_with(&config.world.directory, &config.level) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open world {}: {e}", config.world.directory.display());
            return ExitCode::FAILURE;
        }
    };
    info!("Opened world at {}", store.world_dir().display());

    match commands::run(&store, &args.command) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
