//! Selection state persistence.
//!
//! The selected profile of every scope is kept in `state.json` inside the
//! extension directory, so reopening a solution restores the last choice.
//!
//! # Example State File
//!
//! ```json
//! {
//!   "App": "debug",
//!   "Shared": "common"
//! }
//! ```
//!
//! The file is rewritten wholesale after every accepted selection change.
//! A failed write is not fatal: the in-memory selection stays authoritative
//! and the next successful write repairs the file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::util::fs::write_atomic;

/// Persisted scope key → selected profile name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
  pub selections: BTreeMap<String, String>,
}

impl SelectionState {
  pub fn new(selections: BTreeMap<String, String>) -> Self {
    Self { selections }
  }

  pub fn get(&self, scope: &str) -> Option<&str> {
    self.selections.get(scope).map(String::as_str)
  }
}

/// Errors that can occur when working with selection state.
#[derive(Debug, Error)]
pub enum StateError {
  /// Failed to read the state file.
  #[error("failed to read selection state: {0}")]
  Read(#[source] io::Error),

  /// Failed to write the state file.
  #[error("failed to write selection state: {0}")]
  Write(#[source] io::Error),

  /// Failed to parse the state JSON.
  #[error("failed to parse selection state: {0}")]
  Parse(#[source] serde_json::Error),

  /// Failed to serialize the state.
  #[error("failed to serialize selection state: {0}")]
  Serialize(#[source] serde_json::Error),
}

/// Location of `state.json` for one solution.
#[derive(Debug, Clone)]
pub struct StateFile {
  path: PathBuf,
}

impl StateFile {
  pub fn new(ext_dir: &Path, filename: &str) -> Self {
    Self {
      path: ext_dir.join(filename),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Load the persisted selection.
  ///
  /// Returns `Ok(None)` if the file doesn't exist.
  pub fn load(&self) -> Result<Option<SelectionState>, StateError> {
    let content = match fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "selection state not found");
        return Ok(None);
      }
      Err(e) => return Err(StateError::Read(e)),
    };

    // scopes without a selection may be stored as null
    let raw: BTreeMap<String, Option<String>> = serde_json::from_str(&content).map_err(StateError::Parse)?;
    let state = SelectionState::new(raw.into_iter().filter_map(|(k, v)| v.map(|v| (k, v))).collect());
    info!(
      path = %self.path.display(),
      scopes = state.selections.len(),
      "selection state loaded"
    );
    Ok(Some(state))
  }

  /// Save the selection, pretty-printed, via temp file and rename.
  pub fn save(&self, state: &SelectionState) -> Result<(), StateError> {
    let content = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
    write_atomic(&self.path, &content).map_err(StateError::Write)?;

    info!(
      path = %self.path.display(),
      scopes = state.selections.len(),
      "selection state saved"
    );
    Ok(())
  }

  /// Remove the state file. Silently succeeds if it doesn't exist.
  pub fn remove(&self) -> Result<(), StateError> {
    match fs::remove_file(&self.path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(StateError::Write(e)),
    }
  }
}
