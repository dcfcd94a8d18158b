//! Build file linking and target discovery on a real project layout.

use std::fs;

use envswitch_lib::discover::find_targets;
use envswitch_lib::profile::ScopeKey;

use super::common::{TestSolution, fixture_content};

const STUB_IMPORT: &str = "Project=\"$(SolutionDir).vs\\envswitch\\App.props\"";

#[test]
fn attaching_imports_stub_into_project() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let _engine = env.open(&["App"]);

  let project = fs::read_to_string(env.root().join("App").join("App.vcxproj")).unwrap();
  assert_eq!(project.matches(STUB_IMPORT).count(), 1);
  assert!(project.contains("Condition=\"exists('$(SolutionDir).vs\\envswitch\\App.props')\""));

  let stub = fs::read_to_string(env.ext_dir().join("App.props")).unwrap();
  assert!(stub.contains("<Import Project=\"$(MSBuildThisFileDirectory)App.env-"));
}

#[test]
fn relinking_does_not_duplicate_imports() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);
  let project_path = env.root().join("App").join("App.vcxproj");

  engine.request_select(&ScopeKey::target("App"), "debug");
  engine.request_select(&ScopeKey::target("App"), "release");
  engine.on_solution_closing();

  let mut reopened = env.engine();
  reopened.on_solution_opening(env.temp.path()).unwrap();
  reopened.on_target_discovered("App", Some(env.handle(&project_path)));

  let project = fs::read_to_string(&project_path).unwrap();
  assert_eq!(project.matches(STUB_IMPORT).count(), 1);
}

#[test]
fn crlf_projects_stay_crlf() {
  let env = TestSolution::from_fixture("basic.envswitch");
  env.write_file("App/App.vcxproj", &fixture_content("App.vcxproj").replace('\n', "\r\n"));
  let project_path = env.root().join("App").join("App.vcxproj");

  let mut engine = env.engine();
  engine.on_solution_opening(env.temp.path()).unwrap();
  engine.on_target_discovered("App", Some(env.handle(&project_path)));

  let project = fs::read_to_string(&project_path).unwrap();
  assert!(project.contains(STUB_IMPORT));
  assert!(!project.replace("\r\n", "").contains('\n'));
}

#[test]
fn discovered_projects_feed_the_engine() {
  let env = TestSolution::from_fixture("basic.envswitch");
  env.add_project("App");
  env.add_project("Tool");
  env.add_project("Docs");

  let mut engine = env.engine();
  engine.on_solution_opening(env.temp.path()).unwrap();
  for target in find_targets(&env.root()).unwrap() {
    engine.on_target_discovered(&target.name, Some(env.handle(&target.path)));
  }
  engine.on_solution_opened();

  assert_eq!(engine.active_scopes(), vec![ScopeKey::Shared, ScopeKey::target("App")]);
  assert!(engine.list_options(&ScopeKey::target("Docs")).is_empty());
  assert!(env.ext_dir().join("Docs.props").exists());
}

#[test]
fn ampersand_in_target_name_keeps_project_well_formed() {
  let env = TestSolution::empty();
  env.write_file(".envswitch", "[env:debug|R&D]\nLOG_LEVEL:int=3\n");
  let mut engine = env.open(&["R&D"]);
  assert!(engine.request_select(&ScopeKey::target("R&D"), "debug"));

  let project = fs::read_to_string(env.root().join("R&D").join("R&D.vcxproj")).unwrap();
  assert_eq!(
    project
      .matches("<Import Project=\"$(SolutionDir).vs\\envswitch\\R&amp;D.props\"")
      .count(),
    1
  );
  assert!(!project.contains("R&D.props"));
  assert!(env.linked_artifact(&engine, &ScopeKey::target("R&D")).contains("LOG_LEVEL=$(LOG_LEVEL);"));
}

#[test]
fn project_named_shared_is_not_a_target() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let engine = env.open(&["App", "Shared"]);

  let project = fs::read_to_string(env.root().join("Shared").join("Shared.vcxproj")).unwrap();
  assert_eq!(project, fixture_content("App.vcxproj"));
  assert!(engine.solution().unwrap().attachment("Shared").is_none());
  assert!(env.sink.lines().iter().any(|l| l.contains("reserved for shared profiles")));
}
