//! Engine configuration.
//!
//! Defaults come from [`crate::consts`]. Two environment variables override
//! them, mirroring how the CLI and tests relocate derived files:
//! - `ENVSWITCH_EXT_DIR`: extension directory, relative to the solution root
//!   (or absolute)
//! - `ENVSWITCH_CONFIG`: comma-separated config file candidates

use std::path::{Path, PathBuf};

use crate::consts::{CONFIG_CANDIDATES, EXT_REL_PATH, STATE_FILENAME};

/// Environment variable overriding the extension directory.
pub const EXT_DIR_ENV: &str = "ENVSWITCH_EXT_DIR";

/// Environment variable overriding the config candidate list.
pub const CONFIG_ENV: &str = "ENVSWITCH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
  /// Config file names probed in the solution root, in order.
  pub config_candidates: Vec<String>,
  /// Extension directory holding derived sheets and `state.json`.
  pub ext_dir: PathBuf,
  /// Persisted selection file name.
  pub state_filename: String,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self {
      config_candidates: CONFIG_CANDIDATES.iter().map(|s| s.to_string()).collect(),
      ext_dir: PathBuf::from(EXT_REL_PATH),
      state_filename: STATE_FILENAME.to_string(),
    }
  }
}

impl EngineOptions {
  /// Defaults with environment overrides applied.
  pub fn from_env() -> Self {
    let mut options = Self::default();

    if let Ok(dir) = std::env::var(EXT_DIR_ENV)
      && !dir.trim().is_empty()
    {
      options.ext_dir = PathBuf::from(dir.trim());
    }

    if let Ok(list) = std::env::var(CONFIG_ENV) {
      let candidates: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
      if !candidates.is_empty() {
        options.config_candidates = candidates;
      }
    }

    options
  }

  /// Absolute extension directory for a solution root.
  pub fn ext_dir_for(&self, solution_dir: &Path) -> PathBuf {
    if self.ext_dir.is_absolute() {
      self.ext_dir.clone()
    } else {
      solution_dir.join(&self.ext_dir)
    }
  }
}
