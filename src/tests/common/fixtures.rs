//! Test Fixtures
//!
//! Builds repositories, services and engines over the files in `data/`
//! or over hand-written records.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::core::lesson_gen::sources::JsonRecordSource;
use crate::core::lesson_gen::vocabulary::VocabularyItem;
use crate::core::lesson_gen::{
    CulturalGrammarService, InMemoryVocabulary, LessonGenerationEngine, LessonTemplateRepository,
};

/// Seed used wherever a fixture needs reproducible randomness.
pub const TEST_SEED: u64 = 7;

// =============================================================================
// Shipped data
// =============================================================================

pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

pub fn shipped_templates() -> LessonTemplateRepository {
    LessonTemplateRepository::new(JsonRecordSource::directory(data_dir().join("templates")))
        .with_seed(TEST_SEED)
}

pub fn shipped_grammar() -> CulturalGrammarService {
    CulturalGrammarService::new(JsonRecordSource::file(data_dir().join("cultural-grammar.json")))
}

/// Shipped vocabulary with a fixed sampling seed.
pub fn shipped_vocabulary() -> InMemoryVocabulary {
    let contents = std::fs::read_to_string(data_dir().join("vocabulary.json"))
        .expect("Failed to read shipped vocabulary");
    let value: Value = serde_json::from_str(&contents).expect("Shipped vocabulary is not JSON");
    let items: Vec<VocabularyItem> =
        serde_json::from_value(value["items"].clone()).expect("Shipped vocabulary items are invalid");
    InMemoryVocabulary::new(items).with_seed(TEST_SEED)
}

/// Engine over every shipped data file.
pub fn shipped_engine() -> LessonGenerationEngine {
    LessonGenerationEngine::new(
        Arc::new(shipped_templates()),
        Arc::new(shipped_grammar()),
        Arc::new(shipped_vocabulary()),
    )
}

// =============================================================================
// Record builders
// =============================================================================

/// Minimal valid template record.
pub fn template_record(id: &str, lesson_type: &str, range: [&str; 2], body: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Template {id}"),
        "description": "Fixture template",
        "type": lesson_type,
        "difficultyRange": range,
        "template": body,
        "variables": []
    })
}
