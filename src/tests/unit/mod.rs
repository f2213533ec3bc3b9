//! Unit tests spanning several lesson generation modules
//!
//! - `shipped_data_tests`: the files under `data/` load cleanly and render
//! - `lesson_flow_tests`: strategies over the shipped data

mod lesson_flow_tests;
mod shipped_data_tests;
