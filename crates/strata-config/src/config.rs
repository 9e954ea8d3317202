//! Configuration structs with defaults and RON persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_world::LevelOptions;

use crate::error::ConfigError;

/// Name of the config file inside the config directory.
pub const CONFIG_FILE: &str = "strata.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Which world directory to operate on.
    pub world: WorldConfig,
    /// Options used when a new world is created.
    pub level: LevelOptions,
    /// Logging settings.
    pub debug: DebugConfig,
}

/// World location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World directory, relative paths resolved against the working directory.
    pub directory: PathBuf,
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g., "debug", "info,strata_world=trace").
    pub log_level: String,
    /// Also write JSON logs to `log_dir`.
    pub log_to_file: bool,
    /// Directory for JSON log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("world"),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Path of the config file inside `config_dir`.
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE)
    }

    /// Reads `strata.ron` from `config_dir`.
    ///
    /// A missing file is replaced by the defaults, which are written out and
    /// returned.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(config_dir);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let config = ron::from_str(&contents)
                    .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Config::default();
                config.save(config_dir)?;
                log::info!("Wrote default config to {}", path.display());
                Ok(config)
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Writes this config to `config_dir/strata.ron`, creating the directory.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new().depth_limit(3);
        let text = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Encode)?;

        let path = Self::path_in(config_dir);
        fs::write(&path, text).map_err(|source| ConfigError::Write { path, source })
    }
}
