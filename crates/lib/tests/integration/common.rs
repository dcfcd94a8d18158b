//! Shared test helpers for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use envswitch_lib::artifact::{ProjectFile, TargetHandle};
use envswitch_lib::log::BufferSink;
use envswitch_lib::profile::ScopeKey;
use envswitch_lib::{Engine, EngineOptions};
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// A solution directory in a temp dir.
pub struct TestSolution {
  pub temp: TempDir,
  pub sink: BufferSink,
}

impl TestSolution {
  /// Solution whose `.envswitch` is the given fixture.
  pub fn from_fixture(name: &str) -> Self {
    let solution = Self::empty();
    solution.write_file(".envswitch", &fixture_content(name));
    solution
  }

  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
      sink: BufferSink::new(),
    }
  }

  /// Write a file relative to the solution root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  /// Canonical solution root.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn ext_dir(&self) -> PathBuf {
    self.root().join(".vs").join("envswitch")
  }

  /// Add `<name>/<name>.vcxproj` from the project fixture and return its path.
  pub fn add_project(&self, name: &str) -> PathBuf {
    let rel = format!("{name}/{name}.vcxproj");
    self.write_file(&rel, &fixture_content("App.vcxproj"));
    self.root().join(name).join(format!("{name}.vcxproj"))
  }

  /// Handle onto a project added with [`Self::add_project`].
  pub fn handle(&self, project: &Path) -> Box<dyn TargetHandle> {
    Box::new(ProjectFile::new(project, self.root()))
  }

  /// Engine reporting into this solution's sink, not yet opened.
  pub fn engine(&self) -> Engine {
    Engine::new(EngineOptions::default(), Box::new(self.sink.clone()))
  }

  /// Engine opened on this solution with the given projects attached.
  pub fn open(&self, projects: &[&str]) -> Engine {
    let mut engine = self.engine();
    assert!(engine.on_solution_opening(self.temp.path()).unwrap());
    for name in projects {
      let path = self.add_project(name);
      engine.on_target_discovered(name, Some(self.handle(&path)));
    }
    engine.on_solution_opened();
    engine
  }

  /// File names in the extension directory, sorted.
  pub fn ext_files(&self) -> Vec<String> {
    let Ok(entries) = fs::read_dir(self.ext_dir()) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
      .collect();
    names.sort();
    names
  }

  /// Content of the artifact currently linked for `scope`.
  pub fn linked_artifact(&self, engine: &Engine, scope: &ScopeKey) -> String {
    let solution = engine.solution().expect("engine is active");
    let path = solution
      .slot(scope)
      .and_then(|slot| slot.linked())
      .unwrap_or_else(|| panic!("no artifact linked for {}", scope));
    fs::read_to_string(path).unwrap()
  }
}
