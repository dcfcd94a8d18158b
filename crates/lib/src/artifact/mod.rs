//! Derived property sheets.
//!
//! Every scope owns a stable stub sheet (`<scope>.props`) and, behind it, one
//! time-stamped artifact carrying the rendered variables. Build files import
//! the stub; the swap protocol relinks the stub whenever a selection changes.
//!
//! # Submodules
//!
//! - [`render`] - Variables to MSBuild XML, name casing and unquoting rules
//! - [`swap`] - Fresh-name write, stub relink, stale cleanup
//! - [`handle`] - The host's live handle onto a target's build file

pub mod handle;
pub mod render;
pub mod swap;

pub use handle::{HandleError, ProjectFile, TargetHandle};
pub use render::{macro_case, render};
pub use swap::{ArtifactError, ArtifactSlot, SlotState};
