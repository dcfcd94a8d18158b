//! Filesystem helpers shared by state persistence and the swap protocol.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, warn};

/// Write `content` to `path` atomically.
///
/// The content goes to a temp file in the same directory which is then
/// renamed over `path`, so readers see either the old or the new file.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
  let dir = path
    .parent()
    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory"))?;

  let mut temp = tempfile::Builder::new().prefix(".tmp-").tempfile_in(dir)?;
  temp.write_all(content.as_bytes())?;
  temp.as_file().sync_all()?;
  temp.persist(path).map_err(|e| e.error)?;

  debug!(path = %path.display(), bytes = content.len(), "wrote file atomically");
  Ok(())
}

/// Remove a file, ignoring every failure.
///
/// Returns whether the file is gone afterwards.
pub fn remove_best_effort(path: &Path) -> bool {
  match fs::remove_file(path) {
    Ok(()) => true,
    Err(e) if e.kind() == io::ErrorKind::NotFound => true,
    Err(e) => {
      warn!(path = %path.display(), error = %e, "failed to remove file, leaving it behind");
      false
    }
  }
}
