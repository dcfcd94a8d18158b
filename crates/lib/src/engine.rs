//! Host-facing call points.
//!
//! The host drives an [`Engine`] through the solution lifecycle:
//!
//! ```text
//! on_solution_opening ─► on_target_discovered* ─► on_solution_opened
//!        │                       │
//!        │               on_target_handle_attached*   (deferred sheets land here)
//!        ▼
//! list_options / request_select   (gated by build and debug activity)
//!        ▼
//! on_solution_closing             (derived sheets removed)
//! ```
//!
//! Every call point is infallible towards the host except opening, which
//! reports why a solution could not be activated. Everything the user
//! should see goes through the [`LogSink`].

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::artifact::{TargetHandle, render};
use crate::controller::SelectionController;
use crate::log::{LogSink, TracingSink};
use crate::options::EngineOptions;
use crate::profile::{ScopeKey, target_key};
use crate::solution::{SelectOutcome, SolutionError, SolutionState};

/// One selectable profile of a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileOption {
  pub name: String,
  pub selected: bool,
}

/// Current selection of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeSelection {
  pub scope: ScopeKey,
  pub selected: Option<String>,
}

/// What the selection command shows as its caption, e.g. `common / debug`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
  pub scopes: Vec<ScopeSelection>,
}

impl fmt::Display for SelectionSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.scopes.is_empty() {
      return f.write_str("---");
    }
    let parts: Vec<&str> = self
      .scopes
      .iter()
      .map(|s| s.selected.as_deref().unwrap_or("---"))
      .collect();
    f.write_str(&parts.join(" / "))
  }
}

pub struct Engine {
  options: EngineOptions,
  sink: Box<dyn LogSink>,
  solution: Option<SolutionState>,
  controller: SelectionController,
  opened: bool,
}

impl Default for Engine {
  fn default() -> Self {
    Self::new(EngineOptions::from_env(), Box::new(TracingSink))
  }
}

impl Engine {
  pub fn new(options: EngineOptions, sink: Box<dyn LogSink>) -> Self {
    Self {
      options,
      sink,
      solution: None,
      controller: SelectionController::new(),
      opened: false,
    }
  }

  pub fn options(&self) -> &EngineOptions {
    &self.options
  }

  /// The open solution, if it has profiles.
  pub fn solution(&self) -> Option<&SolutionState> {
    self.solution.as_ref()
  }

  pub fn is_active(&self) -> bool {
    self.solution.is_some()
  }

  /// Load the config and restore the persisted selection.
  ///
  /// Returns whether the engine became active. A solution that is still
  /// open is closed first.
  pub fn on_solution_opening(&mut self, path: &Path) -> Result<bool, SolutionError> {
    if self.solution.is_some() {
      self.on_solution_closing();
    }
    self.controller.reset();
    self.opened = false;

    match SolutionState::open(path, &self.options, self.sink.as_ref()) {
      Ok(solution) => {
        self.solution = solution;
        if !self.is_active() {
          info!(path = %path.display(), "no profiles, staying dormant");
        }
        Ok(self.is_active())
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "solution not activated");
        self.sink.write_line(&e.to_string());
        Err(e)
      }
    }
  }

  /// Target enumeration is over; offer the command if any scope applies.
  pub fn on_solution_opened(&mut self) {
    self.opened = true;
    self.refresh_gate();
  }

  /// A target the host enumerated, with its build file handle if loaded.
  ///
  /// The first target with profiles becomes the active one.
  pub fn on_target_discovered(&mut self, name: &str, handle: Option<Box<dyn TargetHandle>>) {
    let Some(solution) = self.solution.as_mut() else {
      return;
    };
    solution.discover(name, handle, self.sink.as_ref());

    if self.controller.active_target().is_none() {
      let active = self.target_with_profiles(name);
      if active.is_some() {
        self.controller.set_active_target(active);
      }
    }
    self.refresh_gate();
  }

  pub fn on_target_handle_attached(&mut self, name: &str, handle: Box<dyn TargetHandle>) {
    if let Some(solution) = self.solution.as_mut() {
      solution.attach(name, handle, self.sink.as_ref());
    }
  }

  pub fn on_target_removed(&mut self, name: &str) {
    let Some(solution) = self.solution.as_mut() else {
      return;
    };
    solution.remove_target(name);

    if self
      .controller
      .active_target()
      .is_some_and(|active| target_key(active.as_str()) == target_key(name))
    {
      self.controller.set_active_target(None);
    }
    self.refresh_gate();
  }

  /// Remove every derived sheet and forget the solution.
  pub fn on_solution_closing(&mut self) {
    if let Some(solution) = self.solution.take() {
      solution.close();
    }
    self.controller.reset();
    self.opened = false;
  }

  /// Focus moved to another target. Targets without profiles clear the
  /// active target so only shared selections remain available.
  pub fn on_active_target_changed(&mut self, name: &str) {
    let active = self.target_with_profiles(name);
    self.controller.set_active_target(active);
    self.refresh_gate();
  }

  pub fn on_build_begin(&mut self) {
    self.controller.on_build_begin();
  }

  pub fn on_build_done(&mut self) {
    self.controller.on_build_done();
  }

  pub fn on_debug_run(&mut self) {
    self.controller.on_debug_run();
  }

  pub fn on_design_mode(&mut self) {
    self.controller.on_design_mode();
  }

  pub fn is_selection_enabled(&self) -> bool {
    self.controller.is_selection_enabled()
  }

  /// Scopes the selection command applies to: shared if it has profiles,
  /// then the active target.
  pub fn active_scopes(&self) -> Vec<ScopeKey> {
    let Some(solution) = &self.solution else {
      return Vec::new();
    };
    let mut scopes = Vec::new();
    if !solution.store().shared().is_empty() {
      scopes.push(ScopeKey::Shared);
    }
    if let Some(target) = self.controller.active_target() {
      scopes.push(target.clone());
    }
    scopes
  }

  /// Profiles of a scope in declaration order, flagging the selected one.
  pub fn list_options(&self, scope: &ScopeKey) -> Vec<ProfileOption> {
    let Some(set) = self.solution.as_ref().and_then(|s| s.store().set(scope)) else {
      return Vec::new();
    };
    set
      .profile_names()
      .map(|name| ProfileOption {
        name: name.to_string(),
        selected: set.selected() == Some(name),
      })
      .collect()
  }

  /// Ask for `profile` to become the selection of `scope`.
  ///
  /// On acceptance the sheets and `state.json` are updated before this
  /// returns. A failed swap keeps the previous selection and returns false.
  /// The outcome is reported to the sink either way.
  pub fn request_select(&mut self, scope: &ScopeKey, profile: &str) -> bool {
    let Some(solution) = self.solution.as_mut() else {
      self.sink.write_line("No solution with environment profiles is open.");
      return false;
    };
    if !self.controller.is_selection_enabled() {
      debug!(scope = %scope, profile, "selection rejected by gate");
      self
        .sink
        .write_line(&format!("[{}] selection is disabled right now.", scope));
      return false;
    }

    let Some(scope) = solution.store().canonical(scope) else {
      self.sink.write_line(&format!("[{}] unknown scope.", scope));
      return false;
    };
    let known = solution.store().set(&scope).is_some_and(|set| set.contains(profile));
    if !known {
      self
        .sink
        .write_line(&format!("[{}] unknown profile: {}.", scope, profile));
      return false;
    }

    match solution.select(&scope, profile, self.sink.as_ref()) {
      SelectOutcome::Applied => {
        self
          .sink
          .write_line(&format!("[{}] environment updated: {}.", scope, profile));
        true
      }
      SelectOutcome::RolledBack => false,
      SelectOutcome::Unchanged => {
        debug!(scope = %scope, profile, "profile already selected");
        false
      }
    }
  }

  /// Selections of the active scopes, for the command caption.
  pub fn selection_summary(&self) -> SelectionSummary {
    let Some(solution) = &self.solution else {
      return SelectionSummary::default();
    };
    SelectionSummary {
      scopes: self
        .active_scopes()
        .into_iter()
        .map(|scope| ScopeSelection {
          selected: solution.store().selected(&scope).map(String::from),
          scope,
        })
        .collect(),
    }
  }

  /// Re-materialize the shared sheet and every attached target.
  ///
  /// Returns false if any swap failed; failures are reported to the sink.
  pub fn refresh(&mut self) -> bool {
    match self.solution.as_mut() {
      Some(solution) => solution.materialize_all(self.sink.as_ref()),
      None => false,
    }
  }

  /// The sheet `scope` would get for the current selection, without writing it.
  pub fn render(&self, scope: &ScopeKey) -> Option<String> {
    let solution = self.solution.as_ref()?;
    solution.store().set(scope)?;
    Some(render(solution.store(), scope))
  }

  /// Canonical key of `name` if it is a known target with profiles.
  fn target_with_profiles(&self, name: &str) -> Option<ScopeKey> {
    let solution = self.solution.as_ref()?;
    let scope = ScopeKey::parse(name);
    if scope.is_shared() {
      return None;
    }
    solution
      .store()
      .set(&scope)
      .filter(|set| !set.is_empty())
      .map(|set| set.scope().clone())
  }

  fn refresh_gate(&mut self) {
    let available = self.opened && !self.active_scopes().is_empty();
    self.controller.set_available(available);
  }
}
