//! Finding build targets under a solution directory.
//!
//! Stands in for the host's project enumeration: every `*.vcxproj` below
//! the solution root is a target named after its file stem.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Project file extension, compared case-insensitively.
pub const PROJECT_EXT: &str = "vcxproj";

/// How deep below the solution root projects are searched.
pub const MAX_DEPTH: usize = 6;

/// Directories never searched.
const SKIP_DIRS: &[&str] = &["node_modules", "target", "bin", "obj"];

#[derive(Debug, Error)]
pub enum DiscoverError {
  #[error("failed to walk {}: {message}", path.display())]
  Walk { path: PathBuf, message: String },
}

/// A project file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTarget {
  pub name: String,
  pub path: PathBuf,
}

/// All projects below `solution_dir`, sorted by path.
///
/// Hidden directories (`.vs`, `.git`, ...) and build output directories are
/// skipped.
pub fn find_targets(solution_dir: &Path) -> Result<Vec<DiscoveredTarget>, DiscoverError> {
  let walker = WalkDir::new(solution_dir)
    .max_depth(MAX_DEPTH)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_skipped(e.file_name().to_str()));

  let mut found = Vec::new();
  for entry in walker {
    let entry = entry.map_err(|e| DiscoverError::Walk {
      path: solution_dir.to_path_buf(),
      message: e.to_string(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }

    let path = entry.path();
    let is_project = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_EXT));
    let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
      continue;
    };
    if is_project {
      debug!(target = name, path = %path.display(), "found project");
      found.push(DiscoveredTarget {
        name: name.to_string(),
        path: path.to_path_buf(),
      });
    }
  }

  Ok(found)
}

fn is_skipped(name: Option<&str>) -> bool {
  match name {
    Some(name) => name.starts_with('.') || SKIP_DIRS.iter().any(|skip| name.eq_ignore_ascii_case(skip)),
    None => true,
  }
}
