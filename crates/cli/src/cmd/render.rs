//! Implementation of the `envswitch render` command.
//!
//! Prints the property sheet a scope would get for the persisted
//! selection without writing anything.

use std::path::Path;

use anyhow::{Context, Result};

use envswitch_lib::profile::ScopeKey;

use crate::session::{Access, Session};

pub fn cmd_render(solution: &Path, scope: &str) -> Result<()> {
  let session = Session::open(solution, Access::ReadOnly)?;
  let key = ScopeKey::parse(scope);
  let sheet = session
    .engine
    .render(&key)
    .with_context(|| format!("Unknown scope '{}'", scope))?;
  print!("{}", sheet);
  Ok(())
}
