use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, write_atomic, PathResolver},
    errors::{FarmError, Result},
    projection::DEFAULT_YEAR_COUNT,
};

const MAX_YEAR_COUNT: usize = 50;
const MAX_DISPLAY_DECIMALS: u32 = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Program years rendered in the year-to-year table, with or without data.
    pub program_year_count: usize,
    pub display_decimals: u32,
    pub backup_retention: usize,
    /// Reject a store that contains malformed rows instead of skipping them.
    pub strict_rows: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_year_count: DEFAULT_YEAR_COUNT,
            display_decimals: 2,
            backup_retention: 5,
            strict_rows: true,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.program_year_count == 0 || self.program_year_count > MAX_YEAR_COUNT {
            return Err(FarmError::Config(format!(
                "program_year_count must be between 1 and {MAX_YEAR_COUNT}, got {}",
                self.program_year_count
            )));
        }
        if self.display_decimals > MAX_DISPLAY_DECIMALS {
            return Err(FarmError::Config(format!(
                "display_decimals must be at most {MAX_DISPLAY_DECIMALS}, got {}",
                self.display_decimals
            )));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        ensure_dir(&PathResolver::config_dir_in(&base))?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    /// Defaults when no file exists yet. A present but invalid file is an error.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| FarmError::Config(format!("{}: {err}", self.path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        write_atomic(&self.path, &serde_json::to_string_pretty(config)?)?;
        tracing::info!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
