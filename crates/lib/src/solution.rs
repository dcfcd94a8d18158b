//! Per-solution context: profiles, target attachments and derived files.
//!
//! A [`SolutionState`] exists from the moment a solution with a config is
//! opened until it closes. It owns the profile store, one artifact slot per
//! scope, and the persisted selection. Closing removes every derived sheet
//! but keeps `state.json` so the next open restores the same selection.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactError, ArtifactSlot, TargetHandle, render};
use crate::config::{self, ConfigError};
use crate::log::LogSink;
use crate::options::EngineOptions;
use crate::profile::{ProfileStore, ScopeKey, target_key};
use crate::state::{SelectionState, StateFile};

/// Errors that prevent a solution from becoming active.
#[derive(Debug, Error)]
pub enum SolutionError {
  #[error("failed to resolve solution directory {}: {source}", path.display())]
  Resolve { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to create extension directory {}: {source}", path.display())]
  CreateExtDir { path: PathBuf, source: std::io::Error },
}

/// How far a target has come in its two-phase initialization.
///
/// An unattached target has no sheet on disk. Attaching always renders one.
pub enum Attachment {
  /// Known by name only.
  Unattached,
  /// The host handed over its build file.
  Attached(Box<dyn TargetHandle>),
}

impl Attachment {
  pub fn is_attached(&self) -> bool {
    matches!(self, Attachment::Attached(_))
  }
}

impl std::fmt::Debug for Attachment {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Attachment::Unattached => f.write_str("Unattached"),
      Attachment::Attached(_) => f.write_str("Attached"),
    }
  }
}

/// What [`SolutionState::select`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
  /// Unknown scope or profile, or already selected. Nothing was touched.
  Unchanged,
  /// Sheets and `state.json` carry the new selection.
  Applied,
  /// A swap failed and the previous selection was put back.
  RolledBack,
}

#[derive(Debug)]
struct TargetEntry {
  attachment: Attachment,
  slot: ArtifactSlot,
}

/// The open solution.
#[derive(Debug)]
pub struct SolutionState {
  solution_dir: PathBuf,
  ext_dir: PathBuf,
  config_path: PathBuf,
  store: ProfileStore,
  shared_slot: ArtifactSlot,
  targets: BTreeMap<String, TargetEntry>,
  state_file: StateFile,
}

/// Directory of a solution given either the directory or a file inside it.
pub fn solution_dir(path: &Path) -> Result<PathBuf, SolutionError> {
  let resolved = dunce::canonicalize(path).map_err(|source| SolutionError::Resolve {
    path: path.to_path_buf(),
    source,
  })?;
  if resolved.is_file() {
    Ok(resolved.parent().map(Path::to_path_buf).unwrap_or(resolved))
  } else {
    Ok(resolved)
  }
}

impl SolutionState {
  /// Open the solution at `path` (its directory or its `.sln` file).
  ///
  /// Returns `Ok(None)` when there is no config or it declares no profiles;
  /// the engine stays dormant for that solution. Parse warnings go to `sink`.
  pub fn open(path: &Path, options: &EngineOptions, sink: &dyn LogSink) -> Result<Option<Self>, SolutionError> {
    let solution_dir = solution_dir(path)?;

    let Some(loaded) = config::load(&solution_dir, &options.config_candidates)? else {
      return Ok(None);
    };
    for warning in &loaded.parsed.warnings {
      sink.write_line(&warning.to_string());
    }
    if !loaded.parsed.found() {
      info!(config = %loaded.path.display(), "config declares no profiles");
      return Ok(None);
    }

    let ext_dir = options.ext_dir_for(&solution_dir);
    fs::create_dir_all(&ext_dir).map_err(|source| SolutionError::CreateExtDir {
      path: ext_dir.clone(),
      source,
    })?;

    let mut solution = Self {
      shared_slot: ArtifactSlot::new(&ext_dir, ScopeKey::Shared),
      state_file: StateFile::new(&ext_dir, &options.state_filename),
      targets: BTreeMap::new(),
      store: loaded.parsed.profiles,
      config_path: loaded.path,
      solution_dir,
      ext_dir,
    };
    solution.restore(sink);

    info!(
      solution = %solution.solution_dir.display(),
      ext_dir = %solution.ext_dir.display(),
      "solution opened"
    );
    Ok(Some(solution))
  }

  /// Apply the persisted selection. Entries naming unknown scopes or
  /// profiles are ignored.
  fn restore(&mut self, sink: &dyn LogSink) {
    let state = match self.state_file.load() {
      Ok(Some(state)) => state,
      Ok(None) => return,
      Err(e) => {
        warn!(error = %e, "ignoring unreadable selection state");
        sink.write_line(&e.to_string());
        return;
      }
    };

    for (scope, profile) in &state.selections {
      let key = ScopeKey::parse(scope);
      if self.store.select(&key, profile) {
        debug!(scope = %key, profile = %profile, "restored selection");
      } else {
        debug!(scope = %key, profile = %profile, "skipping stale selection");
      }
    }
  }

  pub fn solution_dir(&self) -> &Path {
    &self.solution_dir
  }

  pub fn ext_dir(&self) -> &Path {
    &self.ext_dir
  }

  pub fn config_path(&self) -> &Path {
    &self.config_path
  }

  pub fn store(&self) -> &ProfileStore {
    &self.store
  }

  pub fn state_file(&self) -> &StateFile {
    &self.state_file
  }

  /// Artifact slot of a scope, if the scope is known.
  pub fn slot(&self, scope: &ScopeKey) -> Option<&ArtifactSlot> {
    match scope {
      ScopeKey::Shared => Some(&self.shared_slot),
      ScopeKey::Target(name) => self.targets.get(&target_key(name)).map(|entry| &entry.slot),
    }
  }

  pub fn attachment(&self, target: &str) -> Option<&Attachment> {
    self.targets.get(&target_key(target)).map(|entry| &entry.attachment)
  }

  /// Names of discovered targets, in discovery-independent key order.
  pub fn discovered(&self) -> impl Iterator<Item = &ScopeKey> {
    self.targets.values().map(|entry| entry.slot.scope())
  }

  /// Record a target the host enumerated.
  ///
  /// Targets absent from the config get an empty set. A handle, if already
  /// available, is attached right away. A target named like the shared scope
  /// would share its sheet and `state.json` key, so it is ignored.
  pub fn discover(&mut self, name: &str, handle: Option<Box<dyn TargetHandle>>, sink: &dyn LogSink) {
    if ScopeKey::parse(name).is_shared() {
      warn!(target = name.trim(), "target name is reserved for shared profiles");
      sink.write_line(&format!(
        "[{}] target name is reserved for shared profiles, ignored.",
        name.trim()
      ));
      return;
    }
    self.store.register(name);
    let key = target_key(name);
    if !self.targets.contains_key(&key) {
      let requested = ScopeKey::target(name.trim());
      let scope = self.store.canonical(&requested).unwrap_or(requested);
      debug!(target = %scope, "target discovered");
      self.targets.insert(
        key,
        TargetEntry {
          attachment: Attachment::Unattached,
          slot: ArtifactSlot::new(&self.ext_dir, scope),
        },
      );
    }
    if let Some(handle) = handle {
      self.attach(name, handle, sink);
    }
  }

  /// Hand over a target's build file and render its sheet.
  pub fn attach(&mut self, name: &str, handle: Box<dyn TargetHandle>, sink: &dyn LogSink) {
    let key = target_key(name);
    if !self.targets.contains_key(&key) {
      self.discover(name, None, sink);
    }
    let Some(entry) = self.targets.get_mut(&key) else {
      return;
    };

    entry.attachment = Attachment::Attached(handle);
    debug!(target = %entry.slot.scope(), "target handle attached");

    let scope = entry.slot.scope().clone();
    self.materialize_reported(&scope, sink);
  }

  /// Detach a target and delete its derived files. Its profiles stay known
  /// so the target can be rediscovered later.
  pub fn remove_target(&mut self, name: &str) {
    if let Some(mut entry) = self.targets.remove(&target_key(name)) {
      entry.slot.remove();
      info!(target = %entry.slot.scope(), "target removed");
    }
  }

  /// Render and swap in the sheet for `scope`.
  ///
  /// Unattached targets are skipped and yield `Ok(None)`; they render on attach.
  pub fn materialize(&mut self, scope: &ScopeKey) -> Result<Option<PathBuf>, ArtifactError> {
    let content = render(&self.store, scope);
    match scope {
      ScopeKey::Shared => self.shared_slot.materialize(&content, None).map(Some),
      ScopeKey::Target(name) => {
        let Some(entry) = self.targets.get_mut(&target_key(name)) else {
          debug!(target = %scope, "materialize skipped for undiscovered target");
          return Ok(None);
        };
        match &mut entry.attachment {
          Attachment::Attached(handle) => entry.slot.materialize(&content, Some(handle.as_mut())).map(Some),
          Attachment::Unattached => {
            debug!(target = %scope, "materialization deferred until handle attaches");
            Ok(None)
          }
        }
      }
    }
  }

  /// [`Self::materialize`], reporting a failed swap to the sink. False on failure.
  fn materialize_reported(&mut self, scope: &ScopeKey, sink: &dyn LogSink) -> bool {
    match self.materialize(scope) {
      Ok(_) => true,
      Err(e) => {
        warn!(scope = %scope, error = %e, "swap aborted, previous artifact kept");
        sink.write_line(&format!("[{}] failed to update environment: {}", scope, e));
        false
      }
    }
  }

  /// Every attached target, plus the shared sheet.
  pub fn materialize_all(&mut self, sink: &dyn LogSink) -> bool {
    let mut ok = self.materialize_reported(&ScopeKey::Shared, sink);
    let attached: Vec<ScopeKey> = self
      .targets
      .values()
      .filter(|entry| entry.attachment.is_attached())
      .map(|entry| entry.slot.scope().clone())
      .collect();
    for scope in attached {
      ok &= self.materialize_reported(&scope, sink);
    }
    ok
  }

  /// Change a selection and bring derived files and `state.json` up to date.
  ///
  /// Nothing touches disk when the scope or profile is unknown, or the
  /// profile is already selected. When a swap fails the previous selection
  /// is restored and `state.json` is left as it was.
  pub fn select(&mut self, scope: &ScopeKey, profile: &str, sink: &dyn LogSink) -> SelectOutcome {
    let previous = self.store.selected(scope).map(String::from);
    if !self.store.select(scope, profile) {
      return SelectOutcome::Unchanged;
    }
    info!(scope = %scope, profile, "selection changed");

    let applied = if scope.is_shared() {
      self.materialize_all(sink)
    } else {
      self.materialize_reported(scope, sink)
    };
    if !applied {
      self.store.restore(scope, previous.as_deref());
      warn!(scope = %scope, profile, previous = ?previous, "selection rolled back");
      if scope.is_shared() {
        // Targets that did swap carry the rejected shared values.
        self.materialize_all(sink);
      }
      return SelectOutcome::RolledBack;
    }

    self.persist(sink);
    SelectOutcome::Applied
  }

  /// Rewrite `state.json`. A failure is reported and otherwise ignored.
  pub fn persist(&self, sink: &dyn LogSink) {
    let state = SelectionState::new(self.store.selections());
    if let Err(e) = self.state_file.save(&state) {
      warn!(error = %e, "selection kept in memory only");
      sink.write_line(&e.to_string());
    }
  }

  /// Delete every derived sheet. `state.json` is kept.
  pub fn close(mut self) {
    for entry in self.targets.values_mut() {
      entry.slot.remove();
    }
    self.shared_slot.remove();
    info!(solution = %self.solution_dir.display(), "solution closed");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::artifact::{HandleError, SlotState};
  use crate::log::BufferSink;
  use std::cell::{Cell, RefCell};
  use std::rc::Rc;
  use tempfile::TempDir;

  const CONFIG: &str = "\
[env:common]
VERSION=\"1.2.3\"

[env:debug|App]
LOG_LEVEL:int=3

[env:release|App]
LOG_LEVEL:int=1
";

  /// Counts links; clones share the counter.
  #[derive(Clone, Default)]
  struct CountingHandle {
    links: Rc<RefCell<usize>>,
  }

  impl TargetHandle for CountingHandle {
    fn link_stub(&mut self, _stub: &Path) -> Result<bool, HandleError> {
      *self.links.borrow_mut() += 1;
      Ok(true)
    }

    fn save(&mut self) -> Result<(), HandleError> {
      Ok(())
    }
  }

  /// Fails to link while `broken` is set; clones share the flag.
  #[derive(Clone, Default)]
  struct FlakyHandle {
    broken: Rc<Cell<bool>>,
  }

  impl TargetHandle for FlakyHandle {
    fn link_stub(&mut self, _stub: &Path) -> Result<bool, HandleError> {
      if self.broken.get() {
        return Err(HandleError::Host("build file is locked".to_string()));
      }
      Ok(true)
    }

    fn save(&mut self) -> Result<(), HandleError> {
      Ok(())
    }
  }

  fn open(temp: &TempDir, sink: &BufferSink) -> SolutionState {
    fs::write(temp.path().join(".envswitch"), CONFIG).unwrap();
    SolutionState::open(temp.path(), &EngineOptions::default(), sink)
      .unwrap()
      .unwrap()
  }

  #[test]
  fn open_without_config_is_dormant() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let opened = SolutionState::open(temp.path(), &EngineOptions::default(), &sink).unwrap();
    assert!(opened.is_none());
    assert!(!temp.path().join(".vs").exists());
  }

  #[test]
  fn open_with_empty_config_is_dormant() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".envswitch"), "# nothing\nroot = true\n").unwrap();
    let sink = BufferSink::new();
    assert!(SolutionState::open(temp.path(), &EngineOptions::default(), &sink).unwrap().is_none());
  }

  #[test]
  fn open_accepts_solution_file_path() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("All.sln"), "").unwrap();
    fs::write(temp.path().join(".envswitch"), CONFIG).unwrap();
    let sink = BufferSink::new();
    let solution = SolutionState::open(&temp.path().join("All.sln"), &EngineOptions::default(), &sink)
      .unwrap()
      .unwrap();
    assert_eq!(solution.solution_dir(), dunce::canonicalize(temp.path()).unwrap());
    assert!(solution.ext_dir().is_dir());
  }

  #[test]
  fn parse_warnings_reach_the_sink() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".envswitch"), "[env:a]\n=oops\nX=1\n").unwrap();
    let sink = BufferSink::new();
    SolutionState::open(temp.path(), &EngineOptions::default(), &sink).unwrap().unwrap();
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Invalid format at: =oops"));
  }

  #[test]
  fn unattached_target_is_deferred_until_handle_arrives() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("App", None, &sink);

    assert_eq!(solution.select(&ScopeKey::target("App"), "debug", &sink), SelectOutcome::Applied);
    let slot = solution.slot(&ScopeKey::target("App")).unwrap();
    assert_eq!(slot.state(), &SlotState::NoArtifact);

    let handle = CountingHandle::default();
    solution.attach("app", Box::new(handle.clone()), &sink);
    assert_eq!(*handle.links.borrow(), 1);
    let linked = solution.slot(&ScopeKey::target("App")).unwrap().linked().unwrap();
    assert!(fs::read_to_string(linked).unwrap().contains("LOG_LEVEL=$(LOG_LEVEL);"));
  }

  #[test]
  fn shared_change_rematerializes_attached_targets() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    let handle = CountingHandle::default();
    solution.discover("App", Some(Box::new(handle.clone())), &sink);
    solution.discover("Tool", None, &sink);
    assert_eq!(*handle.links.borrow(), 1);

    assert_eq!(solution.select(&ScopeKey::Shared, "common", &sink), SelectOutcome::Applied);

    assert_eq!(*handle.links.borrow(), 2);
    let shared = solution.slot(&ScopeKey::Shared).unwrap().linked().unwrap();
    assert!(fs::read_to_string(shared).unwrap().contains("<VERSION>1.2.3</VERSION>"));
    let app = solution.slot(&ScopeKey::target("App")).unwrap().linked().unwrap();
    assert!(fs::read_to_string(app).unwrap().contains("<VERSION>1.2.3</VERSION>"));
    assert_eq!(solution.slot(&ScopeKey::target("Tool")).unwrap().state(), &SlotState::NoArtifact);
  }

  #[test]
  fn select_persists_and_reopen_restores() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("App", None, &sink);
    assert_eq!(solution.select(&ScopeKey::target("App"), "release", &sink), SelectOutcome::Applied);
    solution.close();

    let reopened = open(&temp, &sink);
    assert_eq!(reopened.store().selected(&ScopeKey::target("App")), Some("release"));
  }

  #[test]
  fn restore_ignores_stale_entries() {
    let temp = TempDir::new().unwrap();
    let ext = temp.path().join(".vs").join("envswitch");
    fs::create_dir_all(&ext).unwrap();
    fs::write(ext.join("state.json"), r#"{"App": "gone", "Ghost": "debug", "Shared": "common"}"#).unwrap();

    let sink = BufferSink::new();
    let solution = open(&temp, &sink);
    assert_eq!(solution.store().selected(&ScopeKey::target("App")), None);
    assert_eq!(solution.store().selected(&ScopeKey::Shared), Some("common"));
  }

  #[test]
  fn corrupt_state_is_reported_not_fatal() {
    let temp = TempDir::new().unwrap();
    let ext = temp.path().join(".vs").join("envswitch");
    fs::create_dir_all(&ext).unwrap();
    fs::write(ext.join("state.json"), "not json").unwrap();

    let sink = BufferSink::new();
    let solution = open(&temp, &sink);
    assert_eq!(solution.store().selected(&ScopeKey::Shared), None);
    assert!(sink.lines().iter().any(|l| l.contains("failed to parse selection state")));
  }

  #[test]
  fn same_selection_is_a_no_op() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    let handle = CountingHandle::default();
    solution.discover("App", Some(Box::new(handle.clone())), &sink);
    let app = ScopeKey::target("App");

    assert_eq!(solution.select(&app, "debug", &sink), SelectOutcome::Applied);
    let artifacts = solution.slot(&app).unwrap().artifacts();
    let linked = solution.slot(&app).unwrap().linked().map(Path::to_path_buf);
    let links = *handle.links.borrow();
    fs::remove_file(solution.state_file().path()).unwrap();

    assert_eq!(solution.select(&app, "debug", &sink), SelectOutcome::Unchanged);
    assert_eq!(solution.slot(&app).unwrap().artifacts(), artifacts);
    assert_eq!(solution.slot(&app).unwrap().linked().map(Path::to_path_buf), linked);
    assert_eq!(*handle.links.borrow(), links);
    assert!(!solution.state_file().path().exists());
  }

  #[test]
  fn failed_swap_rolls_back_selection() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    let handle = FlakyHandle::default();
    solution.discover("App", Some(Box::new(handle.clone())), &sink);
    let app = ScopeKey::target("App");
    assert_eq!(solution.select(&app, "release", &sink), SelectOutcome::Applied);
    let linked = solution.slot(&app).unwrap().linked().map(Path::to_path_buf);
    let state = fs::read_to_string(solution.state_file().path()).unwrap();

    handle.broken.set(true);
    assert_eq!(solution.select(&app, "debug", &sink), SelectOutcome::RolledBack);
    assert_eq!(solution.store().selected(&app), Some("release"));
    assert_eq!(solution.slot(&app).unwrap().linked().map(Path::to_path_buf), linked);
    assert_eq!(fs::read_to_string(solution.state_file().path()).unwrap(), state);

    handle.broken.set(false);
    assert_eq!(solution.select(&app, "debug", &sink), SelectOutcome::Applied);
    assert_eq!(solution.store().selected(&app), Some("debug"));
  }

  #[test]
  fn failed_shared_swap_restores_targets() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("App", Some(Box::new(CountingHandle::default())), &sink);
    let broken = FlakyHandle::default();
    broken.broken.set(true);
    solution.discover("Tool", Some(Box::new(broken)), &sink);

    assert_eq!(solution.select(&ScopeKey::Shared, "common", &sink), SelectOutcome::RolledBack);
    assert_eq!(solution.store().selected(&ScopeKey::Shared), None);
    let app = solution.slot(&ScopeKey::target("App")).unwrap().linked().unwrap();
    assert!(!fs::read_to_string(app).unwrap().contains("VERSION"));
  }

  #[test]
  fn target_named_like_shared_scope_is_ignored() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("shared", Some(Box::new(CountingHandle::default())), &sink);

    assert_eq!(solution.discovered().count(), 0);
    assert!(solution.attachment("shared").is_none());
    assert!(sink.lines().iter().any(|l| l.contains("reserved for shared profiles")));
  }

  #[test]
  fn remove_target_deletes_its_files_only() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("App", Some(Box::new(CountingHandle::default())), &sink);
    solution.select(&ScopeKey::Shared, "common", &sink);
    let app_stub = solution.slot(&ScopeKey::target("App")).unwrap().stub_path();
    assert!(app_stub.exists());

    solution.remove_target("APP");

    assert!(!app_stub.exists());
    assert!(solution.slot(&ScopeKey::Shared).unwrap().linked().is_some());
    assert!(solution.store().set(&ScopeKey::target("App")).is_some());
  }

  #[test]
  fn close_removes_sheets_but_keeps_state() {
    let temp = TempDir::new().unwrap();
    let sink = BufferSink::new();
    let mut solution = open(&temp, &sink);
    solution.discover("App", Some(Box::new(CountingHandle::default())), &sink);
    solution.select(&ScopeKey::Shared, "common", &sink);
    let ext = solution.ext_dir().to_path_buf();

    solution.close();

    let left: Vec<_> = fs::read_dir(&ext)
      .unwrap()
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    assert_eq!(left, vec!["state.json".to_string()]);
  }
}
