//! Swapping a freshly rendered sheet in under a target's stable stub.
//!
//! # Storage Layout
//!
//! ```text
//! {solution}/.vs/envswitch/
//! ├── state.json
//! ├── Shared.props                  # stable stub, imports the current artifact
//! ├── Shared.env-1760640000123.props
//! ├── App.props                     # imported by App.vcxproj
//! └── App.env-1760640005321.props   # rendered variables
//! ```
//!
//! The toolchain may be reading the stub or the current artifact while a
//! build runs, so artifacts are never rewritten in place. Each render goes
//! to a new file, the stub is atomically replaced to point at it, and only
//! then are the older artifacts removed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info};

use super::handle::{HandleError, TargetHandle};
use super::render::{escape, msbuild_escape, render_stub};
use crate::consts::{ARTIFACT_INFIX, PROPS_EXT};
use crate::profile::ScopeKey;
use crate::util::fs::{remove_best_effort, write_atomic};

/// Errors that abort a swap. The previously linked artifact stays in place.
#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("failed to create extension directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write artifact {}: {source}", path.display())]
  WriteArtifact { path: PathBuf, source: std::io::Error },

  #[error("failed to relink stub {}: {source}", path.display())]
  WriteStub { path: PathBuf, source: std::io::Error },

  #[error("failed to link target build file: {0}")]
  Link(#[from] HandleError),
}

/// Where a scope is in the swap lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
  NoArtifact,
  Linked(PathBuf),
  Removed,
}

/// Derived files of one scope.
#[derive(Debug, Clone)]
pub struct ArtifactSlot {
  scope: ScopeKey,
  ext_dir: PathBuf,
  state: SlotState,
}

impl ArtifactSlot {
  pub fn new(ext_dir: &Path, scope: ScopeKey) -> Self {
    Self {
      scope,
      ext_dir: ext_dir.to_path_buf(),
      state: SlotState::NoArtifact,
    }
  }

  pub fn scope(&self) -> &ScopeKey {
    &self.scope
  }

  pub fn state(&self) -> &SlotState {
    &self.state
  }

  /// The artifact the stub currently imports.
  pub fn linked(&self) -> Option<&Path> {
    match &self.state {
      SlotState::Linked(path) => Some(path),
      _ => None,
    }
  }

  /// Stable stub the target's build file imports. Its name never changes.
  pub fn stub_path(&self) -> PathBuf {
    self.ext_dir.join(format!("{}.{}", self.scope, PROPS_EXT))
  }

  /// Write `content` as a new artifact and link it.
  ///
  /// Order matters: artifact file, build-file import of the stub, stub
  /// relink, stale cleanup. Any failure before the relink removes the new
  /// file and leaves the previous artifact linked.
  pub fn materialize(
    &mut self,
    content: &str,
    handle: Option<&mut dyn TargetHandle>,
  ) -> Result<PathBuf, ArtifactError> {
    fs::create_dir_all(&self.ext_dir).map_err(|source| ArtifactError::CreateDir {
      path: self.ext_dir.clone(),
      source,
    })?;

    let fresh = self.fresh_path();
    if let Err(source) = fs::write(&fresh, content) {
      remove_best_effort(&fresh);
      return Err(ArtifactError::WriteArtifact { path: fresh, source });
    }
    debug!(scope = %self.scope, path = %fresh.display(), "artifact written");

    let stub = self.stub_path();
    if let Some(handle) = handle {
      match link(handle, &stub) {
        Ok(changed) => debug!(scope = %self.scope, changed, "target build file linked"),
        Err(e) => {
          remove_best_effort(&fresh);
          return Err(e.into());
        }
      }
    }

    let file_name = fresh
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();
    if let Err(source) = write_atomic(&stub, &render_stub(&escape(&msbuild_escape(&file_name)))) {
      remove_best_effort(&fresh);
      return Err(ArtifactError::WriteStub { path: stub, source });
    }

    self.state = SlotState::Linked(fresh.clone());
    info!(scope = %self.scope, artifact = %fresh.display(), "artifact linked");

    for stale in self.artifacts().into_iter().filter(|p| *p != fresh) {
      remove_best_effort(&stale);
    }

    Ok(fresh)
  }

  /// Delete every artifact of this scope and the stub.
  pub fn remove(&mut self) {
    for path in self.artifacts() {
      remove_best_effort(&path);
    }
    remove_best_effort(&self.stub_path());
    self.state = SlotState::Removed;
    info!(scope = %self.scope, "artifacts removed");
  }

  /// Artifacts of this scope currently on disk.
  pub fn artifacts(&self) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(&self.ext_dir) else {
      return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
      .flatten()
      .map(|e| e.path())
      .filter(|p| p.is_file())
      .filter(|p| {
        p.file_name()
          .and_then(|n| n.to_str())
          .is_some_and(|n| self.is_artifact_name(n))
      })
      .collect();
    found.sort();
    found
  }

  /// `{scope}.env-{digits and dashes}.props`
  fn is_artifact_name(&self, name: &str) -> bool {
    let prefix = format!("{}.{}", self.scope, ARTIFACT_INFIX);
    let suffix = format!(".{}", PROPS_EXT);
    name
      .strip_prefix(&prefix)
      .and_then(|rest| rest.strip_suffix(&suffix))
      .is_some_and(|stamp| !stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit() || c == '-'))
  }

  /// A file name no existing artifact uses.
  fn fresh_path(&self) -> PathBuf {
    let stamp = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_millis();
    let base = format!("{}.{}{}", self.scope, ARTIFACT_INFIX, stamp);

    let mut candidate = self.ext_dir.join(format!("{}.{}", base, PROPS_EXT));
    let mut n = 1;
    while candidate.exists() {
      candidate = self.ext_dir.join(format!("{}-{}.{}", base, n, PROPS_EXT));
      n += 1;
    }
    candidate
  }
}

/// Import the stub into the build file and persist it.
fn link(handle: &mut dyn TargetHandle, stub: &Path) -> Result<bool, HandleError> {
  let changed = handle.link_stub(stub)?;
  handle.save()?;
  Ok(changed)
}
