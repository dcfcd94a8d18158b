//! Driving the engine the way an IDE host would.
//!
//! A session opens the solution, enumerates its projects and finishes
//! opening. Commands that change nothing enumerate projects without
//! handing over their build files, so no project file is touched.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use envswitch_lib::artifact::{ProjectFile, TargetHandle};
use envswitch_lib::discover::{DiscoveredTarget, find_targets};
use envswitch_lib::{Engine, EngineOptions};

use crate::output::ConsoleSink;

/// Whether projects get live handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  ReadOnly,
  Attach,
}

pub struct Session {
  pub engine: Engine,
  pub targets: Vec<DiscoveredTarget>,
}

impl Session {
  /// Open the solution at `path`. Fails if it declares no profiles.
  pub fn open(path: &Path, access: Access) -> Result<Self> {
    let mut engine = Engine::new(EngineOptions::from_env(), Box::new(ConsoleSink));
    let active = engine
      .on_solution_opening(path)
      .with_context(|| format!("Failed to open solution {}", path.display()))?;
    if !active {
      bail!(
        "No environment profiles found in {} (looked for {})",
        path.display(),
        engine.options().config_candidates.join(", ")
      );
    }

    let solution_dir = engine
      .solution()
      .map(|s| s.solution_dir().to_path_buf())
      .context("Solution closed while opening")?;
    let targets = find_targets(&solution_dir).context("Failed to enumerate projects")?;
    debug!(count = targets.len(), access = ?access, "enumerated projects");

    for target in &targets {
      let handle: Option<Box<dyn TargetHandle>> = match access {
        Access::Attach => Some(Box::new(ProjectFile::new(&target.path, &solution_dir))),
        Access::ReadOnly => None,
      };
      engine.on_target_discovered(&target.name, handle);
    }
    engine.on_solution_opened();

    Ok(Self { engine, targets })
  }
}
