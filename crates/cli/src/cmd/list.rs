//! Implementation of the `envswitch list` command.
//!
//! Lists the profiles of the shared scope and of one target, marking the
//! current selection.

use std::path::Path;

use anyhow::{Result, bail};
use serde::Serialize;

use envswitch_lib::engine::ProfileOption;
use envswitch_lib::profile::{ScopeKey, target_key};

use crate::output::{print_info, print_json, print_options};
use crate::session::{Access, Session};

#[derive(Serialize)]
struct ScopeOptions {
  scope: ScopeKey,
  options: Vec<ProfileOption>,
}

/// Execute the list command.
///
/// Without `--target` the first target with profiles is listed, as the
/// host does before any project window has focus.
pub fn cmd_list(solution: &Path, target: Option<&str>, json: bool) -> Result<()> {
  let mut session = Session::open(solution, Access::ReadOnly)?;
  let engine = &mut session.engine;

  if let Some(target) = target {
    engine.on_active_target_changed(target);
    let listed = engine
      .active_scopes()
      .iter()
      .any(|s| !s.is_shared() && target_key(s.as_str()) == target_key(target));
    if !listed {
      bail!("Target '{}' has no environment profiles", target);
    }
  }

  let scopes: Vec<ScopeOptions> = engine
    .active_scopes()
    .into_iter()
    .map(|scope| ScopeOptions {
      options: engine.list_options(&scope),
      scope,
    })
    .collect();

  if json {
    return print_json(&scopes);
  }

  if scopes.is_empty() {
    print_info("No scope has profiles to select.");
  }
  for (i, entry) in scopes.iter().enumerate() {
    if i > 0 {
      println!();
    }
    print_options(entry.scope.as_str(), &entry.options);
  }
  Ok(())
}
