//! Implementation of the `envswitch apply` command.
//!
//! Re-materializes every scope for the persisted selection: each project
//! gets the stub import and a fresh sheet, as when the host loads them.

use std::path::Path;

use anyhow::{Result, bail};

use crate::output::{print_stat, print_success};
use crate::session::{Access, Session};

pub fn cmd_apply(solution: &Path) -> Result<()> {
  let mut session = Session::open(solution, Access::Attach)?;

  if !session.engine.refresh() {
    bail!("Some property sheets could not be updated");
  }

  print_success(&format!("Applied environment: {}", session.engine.selection_summary()));
  print_stat("Projects", &session.targets.len().to_string());
  if let Some(state) = session.engine.solution() {
    print_stat("Sheets", &state.ext_dir().display().to_string());
  }
  Ok(())
}
