//! Dynamic Lesson Generation
//!
//! Builds German/Bulgarian tandem lessons from three data sources:
//! lesson templates, cultural grammar concepts, and a vocabulary store.
//!
//! ## Architecture
//!
//! ```text
//! LessonGenerationParams
//!          │
//!          ▼
//! ┌────────────────────────┐     ┌──────────────────────────┐
//! │ LessonGenerationEngine │────▶│ LessonTemplateRepository │──┐
//! │  thematic / grammar /  │     └──────────────────────────┘  │
//! │  contextual / adaptive │     ┌──────────────────────────┐  │  RecordSource
//! │                        │────▶│ CulturalGrammarService   │──┤  (JSON files,
//! │                        │     └──────────────────────────┘  │   static records)
//! │                        │     ┌──────────────────────────┐  │
//! │                        │────▶│ dyn VocabularyService    │  │
//! └───────────┬────────────┘     └──────────────────────────┘  │
//!             │ TemplateContext                                 │
//!             ▼                                                 │
//!      TemplateRenderer ◀───── validates bodies on load ────────┘
//!             │
//!             ▼
//!      GeneratedLesson
//! ```
//!
//! Both repositories load lazily, exactly once, on first use. Invalid records
//! are rejected individually; when nothing valid loads, a built-in fallback
//! record keeps the system usable.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tandem_lessons::core::lesson_gen::{
//!     CefrLevel, CulturalGrammarService, InMemoryVocabulary, JsonRecordSource,
//!     LessonGenerationEngine, LessonGenerationOptions, LessonGenerationParams,
//!     LessonTemplateRepository, LessonType,
//! };
//!
//! let templates = Arc::new(LessonTemplateRepository::new(
//!     JsonRecordSource::directory("data/templates"),
//! ));
//! let grammar = Arc::new(CulturalGrammarService::new(
//!     JsonRecordSource::file("data/cultural-grammar.json"),
//! ));
//! let vocabulary = Arc::new(InMemoryVocabulary::load_from_file("data/vocabulary.json").await?);
//!
//! let engine = LessonGenerationEngine::new(templates, grammar, vocabulary);
//! let params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
//!     .with_categories(["food"]);
//! let lesson = engine
//!     .generate_lesson(&params, &LessonGenerationOptions::default())
//!     .await?;
//! ```

// ============================================================================
// Foundations
// ============================================================================

/// Error kinds: validation, rendering, generation
pub mod errors;

/// Domain records: templates, grammar concepts, requests, lessons
pub mod types;

/// Learning direction (DE→BG / BG→DE) and its labels
pub mod language;

// ============================================================================
// Data Access
// ============================================================================

/// Record sources feeding the repositories:
/// - JSON files and directories
/// - Static in-memory records
/// - Per-load reports of accepted and rejected records
pub mod sources;

/// Vocabulary items, query types, and the vocabulary service seam
pub mod vocabulary;

/// Part-of-speech correction and display enrichment of vocabulary items
pub mod enrichment;

// ============================================================================
// Rendering
// ============================================================================

/// Logic-light template language
pub mod render;

// ============================================================================
// Repositories and Orchestration
// ============================================================================

/// Lesson templates indexed by lesson type and difficulty
pub mod template_repository;

/// Cultural grammar concepts with criteria queries
pub mod grammar_service;

/// Lesson strategies and section assembly
pub mod engine;

// Re-export commonly used types
pub use engine::LessonGenerationEngine;
pub use errors::{
    DataValidationError, LessonEngineError, LessonGenerationError, Result, TemplateRenderingError,
};
pub use grammar_service::CulturalGrammarService;
pub use language::LanguageDirection;
pub use render::{TemplateContext, TemplateRenderer};
pub use sources::{JsonRecordSource, LoadReport, RecordSource, StaticRecordSource};
pub use template_repository::LessonTemplateRepository;
pub use types::{
    CefrLevel, CulturalGrammarConcept, GeneratedLesson, GeneratedLessonSection,
    GrammarQueryCriteria, LessonGenerationOptions, LessonGenerationParams, LessonTemplate,
    LessonType, PartOfSpeech, SectionType,
};
pub use vocabulary::{InMemoryVocabulary, VocabularyItem, VocabularyService};
