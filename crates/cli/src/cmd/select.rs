//! Implementation of the `envswitch select` command.

use std::path::Path;

use anyhow::{Result, bail};
use tracing::debug;

use envswitch_lib::Engine;
use envswitch_lib::profile::ScopeKey;

use crate::output::{print_info, print_success};
use crate::session::{Access, Session};

/// Which scope a selection was addressed to on the command line.
#[derive(Debug, Clone, Copy)]
pub enum ScopeArg<'a> {
  Shared,
  Target(&'a str),
  /// Whichever active scope declares the profile, target before shared.
  Auto,
}

/// Execute the select command.
///
/// Opens the solution with live project handles, so every project gets its
/// stub import and current sheet, then requests the new selection.
pub fn cmd_select(solution: &Path, profile: &str, scope: ScopeArg<'_>) -> Result<()> {
  let mut session = Session::open(solution, Access::Attach)?;
  let engine = &mut session.engine;

  if let ScopeArg::Target(target) = scope {
    engine.on_active_target_changed(target);
  }
  let key = resolve_scope(engine, profile, scope)?;
  debug!(scope = %key, profile, "requesting selection");

  let current = engine.solution().and_then(|s| s.store().selected(&key).map(String::from));
  if current.as_deref() == Some(profile) {
    print_info(&format!("[{}] '{}' is already selected", key, profile));
    return Ok(());
  }

  if !engine.request_select(&key, profile) {
    bail!("Selection of '{}' for {} was rejected", profile, key);
  }
  print_success(&format!("Environment: {}", engine.selection_summary()));
  Ok(())
}

fn resolve_scope(engine: &Engine, profile: &str, scope: ScopeArg<'_>) -> Result<ScopeKey> {
  let has_profile = |key: &ScopeKey| engine.list_options(key).iter().any(|o| o.name == profile);

  match scope {
    ScopeArg::Shared => Ok(ScopeKey::Shared),
    ScopeArg::Target(target) => {
      let key = ScopeKey::parse(target);
      if engine.list_options(&key).is_empty() {
        bail!("Target '{}' has no environment profiles", target);
      }
      Ok(key)
    }
    ScopeArg::Auto => match engine.active_scopes().into_iter().rev().find(has_profile) {
      Some(key) => Ok(key),
      None => bail!("No active scope declares a profile named '{}'", profile),
    },
  }
}
