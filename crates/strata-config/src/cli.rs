//! Command-line argument parsing for the `strata` tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::Config;

/// Strata world tool arguments.
///
/// CLI values override settings loaded from `strata.ron`.
#[derive(Parser, Debug)]
#[command(name = "strata", about = "Inspect and edit Strata world directories")]
pub struct CliArgs {
    /// World directory.
    #[arg(long)]
    pub world: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on a world directory.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the chunk file size and every occupied index slot.
    Info,
    /// Summarise one chunk.
    Show {
        /// Chunk x coordinate.
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Chunk z coordinate.
        #[arg(allow_negative_numbers = true)]
        z: i32,
    },
    /// Fill the bottom layers of a chunk with one block id and store it.
    Fill {
        /// Chunk x coordinate.
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Chunk z coordinate.
        #[arg(allow_negative_numbers = true)]
        z: i32,
        /// Block id to place.
        #[arg(long)]
        block: u8,
        /// Number of layers from y = 0.
        #[arg(long, default_value_t = 1)]
        height: usize,
    },
    /// Write the network-packed encoding of a chunk to a file.
    Pack {
        /// Chunk x coordinate.
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Chunk z coordinate.
        #[arg(allow_negative_numbers = true)]
        z: i32,
        /// Output file.
        #[arg(long)]
        out: PathBuf,
    },
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref dir) = args.world {
            self.world.directory = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from(["strata", "--world", "/tmp/w", "info"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.directory, PathBuf::from("/tmp/w"));
        // Non-overridden fields retain defaults
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        let args = CliArgs::parse_from(["strata", "info"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config, original);
    }

    #[test]
    fn test_negative_coordinates_parse() {
        let args = CliArgs::parse_from(["strata", "show", "-3", "40"]);
        assert_eq!(args.command, Command::Show { x: -3, z: 40 });
    }

    #[test]
    fn test_fill_arguments() {
        let args = CliArgs::parse_from([
            "strata", "fill", "1", "2", "--block", "7", "--height", "4",
        ]);
        assert_eq!(
            args.command,
            Command::Fill {
                x: 1,
                z: 2,
                block: 7,
                height: 4
            }
        );
    }
}
