//! envswitch-lib: profile engine for per-target build environments
//!
//! This crate switches build targets between named sets of variables
//! declared in a single config file, and keeps an MSBuild property sheet
//! per target in sync with the selection:
//! - `config`: locating and parsing the `[env:...]` config format
//! - `profile`: the shared and per-target profile sets
//! - `state`: the persisted selection (`state.json`)
//! - `artifact`: rendering property sheets and swapping them in place
//! - `controller`: gating when selection changes are allowed
//! - `solution`: the open solution's targets and derived files
//! - `discover`: finding `*.vcxproj` targets on disk
//! - `engine`: the host-facing call points tying it all together

pub mod artifact;
pub mod config;
pub mod consts;
pub mod controller;
pub mod discover;
pub mod engine;
pub mod log;
pub mod options;
pub mod profile;
pub mod solution;
pub mod state;
pub mod util;

pub use engine::Engine;
pub use options::EngineOptions;
