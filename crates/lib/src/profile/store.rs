//! In-memory registry of the shared and per-target profile sets.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{ProfileSet, ScopeKey, Variable, target_key};

/// Shared set plus one set per target.
///
/// Target names are matched case-insensitively; the spelling seen first is
/// kept for display and for `state.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStore {
  shared: ProfileSet,
  targets: BTreeMap<String, ProfileSet>,
}

impl Default for ProfileStore {
  fn default() -> Self {
    Self::new()
  }
}

impl ProfileStore {
  pub fn new() -> Self {
    Self {
      shared: ProfileSet::new(ScopeKey::Shared),
      targets: BTreeMap::new(),
    }
  }

  /// Create an empty set for a target. Returns false if it already exists.
  pub fn register(&mut self, target: &str) -> bool {
    let key = target_key(target);
    if self.targets.contains_key(&key) {
      return false;
    }
    debug!(target = target.trim(), "registering target");
    self
      .targets
      .insert(key, ProfileSet::new(ScopeKey::target(target.trim())));
    true
  }

  /// Drop a target's set. Returns the removed set.
  pub fn remove(&mut self, target: &str) -> Option<ProfileSet> {
    self.targets.remove(&target_key(target))
  }

  pub fn set(&self, scope: &ScopeKey) -> Option<&ProfileSet> {
    match scope {
      ScopeKey::Shared => Some(&self.shared),
      ScopeKey::Target(name) => self.targets.get(&target_key(name)),
    }
  }

  fn set_mut(&mut self, scope: &ScopeKey) -> Option<&mut ProfileSet> {
    match scope {
      ScopeKey::Shared => Some(&mut self.shared),
      ScopeKey::Target(name) => self.targets.get_mut(&target_key(name)),
    }
  }

  fn set_or_register(&mut self, scope: &ScopeKey) -> &mut ProfileSet {
    match scope {
      ScopeKey::Shared => &mut self.shared,
      ScopeKey::Target(name) => self
        .targets
        .entry(target_key(name))
        .or_insert_with(|| ProfileSet::new(ScopeKey::target(name.trim()))),
    }
  }

  pub fn shared(&self) -> &ProfileSet {
    &self.shared
  }

  /// Resolve a scope to the canonical key (display spelling of the target).
  pub fn canonical(&self, scope: &ScopeKey) -> Option<ScopeKey> {
    self.set(scope).map(|set| set.scope().clone())
  }

  /// Declare a profile, registering the target if needed.
  pub fn declare(&mut self, scope: &ScopeKey, profile: &str) {
    self.set_or_register(scope).declare(profile);
  }

  /// Append a variable to a profile, creating the profile and target as needed.
  pub fn add_variable(&mut self, scope: &ScopeKey, profile: &str, variable: Variable) {
    self.set_or_register(scope).add_variable(profile, variable);
  }

  /// Change a scope's selection.
  ///
  /// True only when the scope and profile exist and the selection actually
  /// changed. This is the one place redundant regeneration is filtered out.
  pub fn select(&mut self, scope: &ScopeKey, profile: &str) -> bool {
    self.set_mut(scope).is_some_and(|set| set.select(profile))
  }

  /// Undo a [`Self::select`] by putting `previous` back.
  pub fn restore(&mut self, scope: &ScopeKey, previous: Option<&str>) {
    if let Some(set) = self.set_mut(scope) {
      set.restore(previous);
    }
  }

  pub fn selected(&self, scope: &ScopeKey) -> Option<&str> {
    self.set(scope).and_then(|set| set.selected())
  }

  pub fn current_variables(&self, scope: &ScopeKey) -> &[Variable] {
    self.set(scope).map(|set| set.current_variables()).unwrap_or_default()
  }

  /// Target sets in key order.
  pub fn targets(&self) -> impl Iterator<Item = &ProfileSet> {
    self.targets.values()
  }

  /// Every set, shared first.
  pub fn sets(&self) -> impl Iterator<Item = &ProfileSet> {
    std::iter::once(&self.shared).chain(self.targets.values())
  }

  /// Whether any scope declares at least one profile.
  pub fn has_profiles(&self) -> bool {
    self.sets().any(|set| !set.is_empty())
  }

  /// Scopes with a selection, as persisted in `state.json`.
  pub fn selections(&self) -> BTreeMap<String, String> {
    self
      .sets()
      .filter_map(|set| set.selected().map(|p| (set.scope().to_string(), p.to_string())))
      .collect()
  }
}
