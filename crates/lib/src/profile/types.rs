use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::SHARED_NAME;

/// Which profile set an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ScopeKey {
  /// The single global set, applied ahead of every target.
  Shared,
  /// One build target, by its display name.
  Target(String),
}

impl ScopeKey {
  /// Interpret a key as written in the config or `state.json`.
  ///
  /// `Shared` in any case addresses the global set.
  pub fn parse(key: &str) -> Self {
    let key = key.trim();
    if key.eq_ignore_ascii_case(SHARED_NAME) {
      ScopeKey::Shared
    } else {
      ScopeKey::Target(key.to_string())
    }
  }

  pub fn target(name: impl Into<String>) -> Self {
    ScopeKey::Target(name.into())
  }

  pub fn as_str(&self) -> &str {
    match self {
      ScopeKey::Shared => SHARED_NAME,
      ScopeKey::Target(name) => name,
    }
  }

  pub fn is_shared(&self) -> bool {
    matches!(self, ScopeKey::Shared)
  }
}

/// Folded form of a target name. Targets that fold alike are the same target.
pub fn target_key(name: &str) -> String {
  name.trim().to_lowercase()
}

impl fmt::Display for ScopeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<String> for ScopeKey {
  fn from(value: String) -> Self {
    ScopeKey::parse(&value)
  }
}

impl From<ScopeKey> for String {
  fn from(value: ScopeKey) -> Self {
    value.as_str().to_string()
  }
}

/// Why a `key=value` line could not become a [`Variable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
  #[error("variable name is empty")]
  EmptyName,

  #[error("invalid variable name '{0}'")]
  InvalidName(String),
}

/// One `key=value` entry of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
  pub name: String,
  pub value: String,
  /// Also emitted as a preprocessor definition (`key:type=value` syntax).
  pub is_define: bool,
}

impl Variable {
  /// Build a variable from the two halves of a `key=value` line.
  ///
  /// The name is the key up to the first `:`, trimmed. Anything after the
  /// `:` is a type hint that only marks the variable as a define. The name
  /// must be usable as an MSBuild property element name.
  pub fn parse(key: &str, value: &str) -> Result<Self, VariableError> {
    let is_define = key.contains(':');
    let name = key.split(':').next().unwrap_or_default().trim();

    if name.is_empty() {
      return Err(VariableError::EmptyName);
    }
    if !is_valid_name(name) {
      return Err(VariableError::InvalidName(name.to_string()));
    }

    Ok(Self {
      name: name.to_string(),
      value: value.trim().to_string(),
      is_define,
    })
  }
}

/// `[A-Za-z_][A-Za-z0-9_.-]*`, the subset of XML names MSBuild accepts for properties.
fn is_valid_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
    _ => return false,
  }
  chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// A named, ordered list of variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
  pub name: String,
  pub variables: Vec<Variable>,
}

impl Profile {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      variables: Vec::new(),
    }
  }
}

/// All profiles of one scope plus its current selection.
///
/// Profiles keep the order they were first declared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSet {
  scope: ScopeKey,
  profiles: Vec<Profile>,
  selected: Option<String>,
}

impl ProfileSet {
  pub fn new(scope: ScopeKey) -> Self {
    Self {
      scope,
      profiles: Vec::new(),
      selected: None,
    }
  }

  pub fn scope(&self) -> &ScopeKey {
    &self.scope
  }

  pub fn is_empty(&self) -> bool {
    self.profiles.is_empty()
  }

  pub fn profiles(&self) -> &[Profile] {
    &self.profiles
  }

  pub fn profile(&self, name: &str) -> Option<&Profile> {
    self.profiles.iter().find(|p| p.name == name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.profile(name).is_some()
  }

  /// Create an empty profile if it isn't declared yet.
  pub fn declare(&mut self, name: &str) -> &mut Profile {
    let index = match self.profiles.iter().position(|p| p.name == name) {
      Some(index) => index,
      None => {
        self.profiles.push(Profile::new(name));
        self.profiles.len() - 1
      }
    };
    &mut self.profiles[index]
  }

  pub fn add_variable(&mut self, profile: &str, variable: Variable) {
    self.declare(profile).variables.push(variable);
  }

  /// Select a profile.
  ///
  /// Returns true only when the profile exists and differs from the current
  /// selection; anything else leaves the set untouched.
  pub fn select(&mut self, name: &str) -> bool {
    if !self.contains(name) || self.selected.as_deref() == Some(name) {
      return false;
    }
    self.selected = Some(name.to_string());
    true
  }

  pub fn selected(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  /// Put back a selection saved before [`Self::select`]. Names that are not
  /// declared clear the selection.
  pub fn restore(&mut self, previous: Option<&str>) {
    self.selected = previous.filter(|name| self.contains(name)).map(String::from);
  }

  /// Variables of the selected profile, empty when nothing is selected.
  pub fn current_variables(&self) -> &[Variable] {
    self
      .selected
      .as_deref()
      .and_then(|name| self.profile(name))
      .map(|p| p.variables.as_slice())
      .unwrap_or_default()
  }

  pub fn profile_names(&self) -> impl Iterator<Item = &str> {
    self.profiles.iter().map(|p| p.name.as_str())
  }
}
