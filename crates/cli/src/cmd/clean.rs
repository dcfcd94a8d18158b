//! Implementation of the `envswitch clean` command.
//!
//! Closes the solution the way the host does, which removes every derived
//! property sheet. The persisted selection is kept unless `--state` is given.

use std::path::Path;

use anyhow::{Context, Result};

use crate::output::print_success;
use crate::session::{Access, Session};

pub fn cmd_clean(solution: &Path, state: bool) -> Result<()> {
  let mut session = Session::open(solution, Access::ReadOnly)?;
  let state_file = session.engine.solution().map(|s| s.state_file().clone());

  session.engine.on_solution_closing();

  if state && let Some(file) = state_file {
    file.remove().context("Failed to remove selection state")?;
    print_success("Removed property sheets and selection state");
  } else {
    print_success("Removed property sheets");
  }
  Ok(())
}
