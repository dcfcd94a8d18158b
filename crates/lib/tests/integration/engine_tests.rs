//! Engine lifecycle tests against a solution on disk.

use std::fs;

use envswitch_lib::options::EXT_DIR_ENV;
use envswitch_lib::profile::ScopeKey;
use envswitch_lib::{Engine, EngineOptions};
use serial_test::serial;

use super::common::TestSolution;

fn app() -> ScopeKey {
  ScopeKey::target("App")
}

#[test]
fn log_level_define_lands_in_target_sheet() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);

  assert!(engine.request_select(&app(), "debug"));

  let sheet = env.linked_artifact(&engine, &app());
  assert!(sheet.contains("<LOG_LEVEL>3</LOG_LEVEL>"));
  assert!(sheet.contains("<BuildMacro Include=\"LOG_LEVEL\">"));
  assert!(sheet.contains("LOG_LEVEL=$(LOG_LEVEL);MAX_RETRY_COUNT=$(maxRetryCount);%(PreprocessorDefinitions)"));
}

#[test]
fn shared_variables_precede_every_target() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App", "Tool"]);

  engine.request_select(&app(), "release");
  engine.request_select(&ScopeKey::target("Tool"), "debug");
  engine.request_select(&ScopeKey::Shared, "common");

  for scope in [app(), ScopeKey::target("Tool")] {
    let sheet = env.linked_artifact(&engine, &scope);
    let version = sheet.find("<VERSION>1.2.3</VERSION>").unwrap();
    let level = sheet.find("<LOG_LEVEL>").unwrap();
    assert!(version < level, "shared variables first in {}", scope);
  }
  let app_sheet = env.linked_artifact(&engine, &app());
  assert!(app_sheet.contains("<DATA_DIR>C:\\data\\release</DATA_DIR>"));
}

#[test]
fn reselecting_current_profile_writes_nothing() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);
  assert!(engine.request_select(&app(), "debug"));
  let files = env.ext_files();
  let state = fs::read_to_string(env.ext_dir().join("state.json")).unwrap();

  assert!(!engine.request_select(&app(), "debug"));

  assert_eq!(env.ext_files(), files);
  assert_eq!(fs::read_to_string(env.ext_dir().join("state.json")).unwrap(), state);
}

#[test]
fn one_artifact_per_scope_after_many_switches() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);

  for profile in ["debug", "release", "debug", "release"] {
    assert!(engine.request_select(&app(), profile));
  }

  let app_artifacts: Vec<_> = env
    .ext_files()
    .into_iter()
    .filter(|name| name.starts_with("App.env-"))
    .collect();
  assert_eq!(app_artifacts.len(), 1);
  assert!(env.linked_artifact(&engine, &app()).contains("<LOG_LEVEL>1</LOG_LEVEL>"));
}

#[test]
fn selection_survives_reopen() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);
  engine.request_select(&ScopeKey::Shared, "common");
  engine.request_select(&app(), "release");
  engine.on_solution_closing();

  let state = fs::read_to_string(env.ext_dir().join("state.json")).unwrap();
  assert_eq!(state, "{\n  \"App\": \"release\",\n  \"Shared\": \"common\"\n}");

  let reopened = env.open(&["App"]);
  assert_eq!(reopened.selection_summary().to_string(), "common / release");
  assert!(env.linked_artifact(&reopened, &app()).contains("<LOG_LEVEL>1</LOG_LEVEL>"));
}

#[test]
fn target_without_handle_is_materialized_on_attach() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let project = env.add_project("App");
  let mut engine = env.engine();
  engine.on_solution_opening(env.temp.path()).unwrap();
  engine.on_target_discovered("App", None);
  engine.on_solution_opened();

  assert!(engine.request_select(&app(), "debug"));
  assert!(!env.ext_dir().join("App.props").exists());

  engine.on_target_handle_attached("App", env.handle(&project));

  assert!(env.ext_dir().join("App.props").exists());
  assert!(env.linked_artifact(&engine, &app()).contains("<LOG_LEVEL>3</LOG_LEVEL>"));
}

#[test]
fn debugging_blocks_selection() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App"]);

  engine.on_debug_run();
  assert!(!engine.is_selection_enabled());
  assert!(!engine.request_select(&app(), "debug"));
  assert_eq!(engine.solution().unwrap().store().selected(&app()), None);

  engine.on_design_mode();
  assert!(engine.request_select(&app(), "debug"));
}

#[test]
fn closing_leaves_only_state() {
  let env = TestSolution::from_fixture("basic.envswitch");
  let mut engine = env.open(&["App", "Tool"]);
  engine.request_select(&ScopeKey::Shared, "common");

  engine.on_solution_closing();

  assert_eq!(env.ext_files(), vec!["state.json".to_string()]);
}

#[test]
fn parse_warnings_are_reported_on_open() {
  let env = TestSolution::empty();
  env.write_file(".envswitch", "[env:a]\nok=1\n:int=2\n[env:]\n");
  let mut engine = env.engine();
  assert!(engine.on_solution_opening(env.temp.path()).unwrap());

  let lines = env.sink.lines();
  assert_eq!(lines.len(), 2);
  assert!(lines[0].starts_with("Invalid format at: :int=2"));
  assert!(lines[1].starts_with("Missing profile name at: [env:]"));
}

#[test]
fn legacy_config_name_is_found() {
  let env = TestSolution::empty();
  env.write_file(".vseswitchenv", "[env:only]\nA=1\n");
  let mut engine = env.engine();
  assert!(engine.on_solution_opening(env.temp.path()).unwrap());
  engine.on_solution_opened();
  assert_eq!(engine.list_options(&ScopeKey::Shared).len(), 1);
}

#[test]
#[serial]
fn ext_dir_override_relocates_derived_files() {
  let env = TestSolution::from_fixture("basic.envswitch");
  temp_env::with_vars([(EXT_DIR_ENV, Some("build/env"))], || {
    let mut engine = Engine::new(EngineOptions::from_env(), Box::new(env.sink.clone()));
    assert!(engine.on_solution_opening(env.temp.path()).unwrap());
    engine.on_solution_opened();
    assert!(engine.request_select(&ScopeKey::Shared, "common"));
  });

  let relocated = env.root().join("build").join("env");
  assert!(relocated.join("Shared.props").exists());
  assert!(relocated.join("state.json").exists());
  assert!(!env.ext_dir().exists());
}
