//! Live handles onto a target's build file.
//!
//! A target only gets artifacts once the host hands over a handle to its
//! build file. The handle's single job is to make the build file import the
//! target's stable stub sheet and persist that change.
//!
//! [`ProjectFile`] is the handle for `.vcxproj` files on disk: it adds a
//! conditional `<Import>` of the stub to every
//! `<ImportGroup Label="PropertySheets">`, leaving everything else untouched.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::render::{escape, msbuild_escape};
use crate::util::fs::write_atomic;

const IMPORT_GROUP_OPEN: &str = "<ImportGroup";
const IMPORT_GROUP_CLOSE: &str = "</ImportGroup>";
const PROPERTY_SHEETS_LABEL: &str = "Label=\"PropertySheets\"";

/// Errors raised by a target handle.
#[derive(Debug, Error)]
pub enum HandleError {
  #[error("failed to read build file {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write build file {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("host rejected build file change: {0}")]
  Host(String),
}

/// The host's live object for one target's build file.
pub trait TargetHandle {
  /// Make the build file import `stub`. Returns true if the build file changed.
  fn link_stub(&mut self, stub: &Path) -> Result<bool, HandleError>;

  /// Persist pending build-file changes.
  fn save(&mut self) -> Result<(), HandleError>;
}

/// A `.vcxproj` on disk.
#[derive(Debug, Clone)]
pub struct ProjectFile {
  path: PathBuf,
  solution_dir: PathBuf,
  pending: Option<String>,
}

impl ProjectFile {
  pub fn new(path: impl Into<PathBuf>, solution_dir: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      solution_dir: solution_dir.into(),
      pending: None,
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Import path as MSBuild reads it, `$(SolutionDir)`-relative when possible.
  ///
  /// Path text is `%XX`-encoded; XML escaping happens when it is written.
  fn import_path(&self, stub: &Path) -> String {
    match stub.strip_prefix(&self.solution_dir) {
      Ok(rel) => {
        let parts: Vec<_> = rel
          .components()
          .map(|c| msbuild_escape(&c.as_os_str().to_string_lossy()))
          .collect();
        format!("$(SolutionDir){}", parts.join("\\"))
      }
      Err(_) => msbuild_escape(&stub.display().to_string()),
    }
  }
}

impl TargetHandle for ProjectFile {
  fn link_stub(&mut self, stub: &Path) -> Result<bool, HandleError> {
    let current = match &self.pending {
      Some(doc) => doc.clone(),
      None => fs::read_to_string(&self.path).map_err(|source| HandleError::Read {
        path: self.path.clone(),
        source,
      })?,
    };

    let import = self.import_path(stub);
    match add_sheet_import(&current, &import) {
      Some(updated) => {
        debug!(project = %self.path.display(), import = %import, "adding stub import");
        self.pending = Some(updated);
        Ok(true)
      }
      None => {
        if !current.contains(PROPERTY_SHEETS_LABEL) {
          warn!(project = %self.path.display(), "build file has no PropertySheets import group");
        }
        Ok(false)
      }
    }
  }

  fn save(&mut self) -> Result<(), HandleError> {
    let Some(doc) = self.pending.take() else {
      return Ok(());
    };
    if let Err(source) = write_atomic(&self.path, &doc) {
      self.pending = Some(doc);
      return Err(HandleError::Write {
        path: self.path.clone(),
        source,
      });
    }
    info!(project = %self.path.display(), "saved build file");
    Ok(())
  }
}

/// Add `<Import Project="{import}" .../>` to every PropertySheets group lacking it.
/// `import` is XML-escaped on the way in.
///
/// Returns `None` when nothing needed to change.
fn add_sheet_import(doc: &str, import: &str) -> Option<String> {
  let newline = if doc.contains("\r\n") { "\r\n" } else { "\n" };
  let import = escape(import);
  let element = format!("<Import Project=\"{import}\" Condition=\"exists('{import}')\" />");
  let marker = format!("Project=\"{import}\"");

  let mut out = String::with_capacity(doc.len() + element.len() * 2);
  let mut rest = doc;
  let mut changed = false;

  while let Some(start) = rest.find(IMPORT_GROUP_OPEN) {
    let Some(tag_len) = rest[start..].find('>').map(|i| i + 1) else {
      break;
    };
    let tag = &rest[start..start + tag_len];
    let after_tag = start + tag_len;

    if !tag.contains(PROPERTY_SHEETS_LABEL) {
      out.push_str(&rest[..after_tag]);
      rest = &rest[after_tag..];
      continue;
    }

    let indent = line_indent(rest, start);

    if tag.ends_with("/>") {
      let open = tag.trim_end_matches("/>").trim_end();
      out.push_str(&rest[..start]);
      out.push_str(&format!(
        "{open}>{newline}{indent}  {element}{newline}{indent}{IMPORT_GROUP_CLOSE}"
      ));
      rest = &rest[after_tag..];
      changed = true;
      continue;
    }

    let Some(close) = rest[after_tag..].find(IMPORT_GROUP_CLOSE).map(|i| after_tag + i) else {
      break;
    };
    let body = &rest[after_tag..close];
    if body.contains(&marker) {
      out.push_str(&rest[..close]);
    } else {
      out.push_str(&rest[..after_tag]);
      out.push_str(body.trim_end());
      out.push_str(&format!("{newline}{indent}  {element}{newline}{indent}"));
      changed = true;
    }
    rest = &rest[close..];
  }
  out.push_str(rest);

  changed.then_some(out)
}

/// Leading whitespace of the line containing byte offset `pos`.
fn line_indent(text: &str, pos: usize) -> &str {
  let line_start = text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
  let prefix = &text[line_start..pos];
  if prefix.chars().all(char::is_whitespace) { prefix } else { "" }
}
