
// Logging setup (tracing subscriber, `log` bridge)
pub mod logging;

// Dynamic lesson generation: templates, grammar concepts, vocabulary, rendering
pub mod lesson_gen;
