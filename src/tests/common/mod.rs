//! Common Test Utilities
//!
//! Shared fixtures used across test modules:
//! - Paths to the shipped data files
//! - Repositories and engines wired to that data
//! - Small record and vocabulary builders

pub mod fixtures;

pub use fixtures::*;
