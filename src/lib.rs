/// Tandem Lessons - Dynamic Lesson Generation
///
/// Core library assembling German/Bulgarian tandem lessons from
/// lesson templates, cultural grammar concepts, and vocabulary.

pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
