//! Status command implementation.
//!
//! Displays the config in use, the selection caption and the selection of
//! every scope that has profiles.

use std::path::Path;

use anyhow::Result;

use envswitch_lib::profile::ScopeKey;

use crate::output::{print_json, print_stat, print_success, symbols};
use crate::session::{Access, Session};

pub fn cmd_status(solution: &Path, verbose: bool, json: bool) -> Result<()> {
  let session = Session::open(solution, Access::ReadOnly)?;
  let engine = &session.engine;
  let Some(state) = engine.solution() else {
    return Ok(());
  };

  let scopes: Vec<(&ScopeKey, Option<&str>, usize)> = state
    .store()
    .sets()
    .filter(|set| !set.is_empty())
    .map(|set| (set.scope(), set.selected(), set.profiles().len()))
    .collect();

  if json {
    let scope_list: Vec<_> = scopes
      .iter()
      .map(|(scope, selected, count)| serde_json::json!({ "scope": scope, "selected": selected, "profiles": count }))
      .collect();
    let json_output = serde_json::json!({
      "config": state.config_path(),
      "ext_dir": state.ext_dir(),
      "summary": engine.selection_summary().to_string(),
      "selection_enabled": engine.is_selection_enabled(),
      "scopes": scope_list,
    });
    return print_json(&json_output);
  }

  print_success(&format!("Environment: {}", engine.selection_summary()));
  print_stat("Config", &state.config_path().display().to_string());
  print_stat("Sheets", &state.ext_dir().display().to_string());
  print_stat("Projects", &session.targets.len().to_string());
  println!();
  for (scope, selected, count) in &scopes {
    println!(
      "  {} {}: {} ({} profiles)",
      symbols::INFO,
      scope,
      selected.unwrap_or("---"),
      count
    );
  }

  if verbose {
    println!();
    println!("Projects:");
    for target in &session.targets {
      println!("  {} {} {} {}", symbols::INFO, target.name, symbols::ARROW, target.path.display());
    }
  }

  Ok(())
}
