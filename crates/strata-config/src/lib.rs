//! Configuration for the Strata world tools.
//!
//! Settings persist to disk as a RON file, fill missing sections with
//! defaults, and accept command-line overrides via clap.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, Command};
pub use config::{CONFIG_FILE, Config, DebugConfig, WorldConfig};
pub use error::ConfigError;
pub use strata_world::LevelOptions;
