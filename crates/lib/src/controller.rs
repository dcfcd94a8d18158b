//! Gate deciding when the selection command is usable.
//!
//! Selection is available while a solution with profiles is open, and is
//! suspended for as long as a build or a debug session runs. Suspension is
//! a permission gate only: nothing in flight is cancelled, the command just
//! stays inert until both activities are over.

use tracing::debug;

use crate::profile::ScopeKey;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
  available: bool,
  building: bool,
  debugging: bool,
  active_target: Option<ScopeKey>,
}

impl SelectionController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether the host should offer the selection command right now.
  pub fn is_selection_enabled(&self) -> bool {
    self.available && !self.building && !self.debugging
  }

  pub fn set_available(&mut self, available: bool) {
    if self.available != available {
      debug!(available, "selection availability changed");
    }
    self.available = available;
  }

  /// Target that per-target selections apply to, if it has profiles.
  pub fn active_target(&self) -> Option<&ScopeKey> {
    self.active_target.as_ref()
  }

  pub fn set_active_target(&mut self, target: Option<ScopeKey>) {
    debug!(target = ?target.as_ref().map(ScopeKey::as_str), "active target changed");
    self.active_target = target;
  }

  pub fn on_build_begin(&mut self) {
    self.building = true;
  }

  pub fn on_build_done(&mut self) {
    self.building = false;
  }

  pub fn on_debug_run(&mut self) {
    self.debugging = true;
  }

  pub fn on_design_mode(&mut self) {
    self.debugging = false;
  }

  /// Forget everything, as when the solution closes.
  pub fn reset(&mut self) {
    *self = Self::default();
  }
}
