//! Crate-level test suites
//!
//! - `common`: fixtures shared across suites
//! - `unit`: checks of the shipped data files and cross-module behaviour
//! - `property`: proptest invariants of the renderer and template selection

mod common;
mod property;
mod unit;
