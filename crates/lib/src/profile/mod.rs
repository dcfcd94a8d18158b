//! Profiles and the store that owns them.
//!
//! A profile is a named, ordered list of variables. Profiles live in
//! profile sets, one shared set applied to every target and one set per
//! build target, each tracking which profile is currently selected.
//!
//! # Submodules
//!
//! - [`store`] - Registry of the shared and per-target sets

pub mod store;
mod types;

pub use store::ProfileStore;
pub use types::*;
