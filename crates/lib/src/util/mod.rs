//! Shared utilities.
//!
//! Atomic writes and best-effort removal used by persistence and the swap protocol.

pub mod fs;
