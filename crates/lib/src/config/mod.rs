//! Locating and loading the solution's config file.
//!
//! The config lives in the solution root under the first existing name of
//! [`EngineOptions::config_candidates`](crate::EngineOptions). When none
//! exists the engine stays dormant for that solution.
//!
//! # Submodules
//!
//! - [`parser`] - The line-oriented `[env:...]` format

pub mod parser;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use parser::{ParseWarning, ParsedConfig, parse};

/// Errors that can occur while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },
}

/// A parsed config and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
  pub path: PathBuf,
  pub parsed: ParsedConfig,
}

/// First candidate that exists as a file in `solution_dir`.
pub fn locate<S: AsRef<str>>(solution_dir: &Path, candidates: &[S]) -> Option<PathBuf> {
  candidates
    .iter()
    .map(|name| solution_dir.join(name.as_ref()))
    .find(|path| path.is_file())
}

/// Locate and parse the config.
///
/// Returns `Ok(None)` when no candidate exists.
pub fn load<S: AsRef<str>>(solution_dir: &Path, candidates: &[S]) -> Result<Option<LoadedConfig>, ConfigError> {
  let Some(path) = locate(solution_dir, candidates) else {
    debug!(dir = %solution_dir.display(), "no config file found");
    return Ok(None);
  };

  let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
    path: path.clone(),
    source,
  })?;
  let parsed = parse(&text);

  info!(
    path = %path.display(),
    found = parsed.found(),
    warnings = parsed.warnings.len(),
    "loaded config"
  );
  Ok(Some(LoadedConfig { path, parsed }))
}
