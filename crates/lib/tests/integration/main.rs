//! Library integration tests.

mod common;
mod engine_tests;
mod project_tests;
