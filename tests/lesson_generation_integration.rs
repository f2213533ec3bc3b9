//! Integration tests for dynamic lesson generation.
//!
//! These tests drive the public API end to end: records go in through
//! record sources, lessons come out of the engine.
//!
//! # Test Categories
//!
//! - **Rendering**: the template language through `TemplateRenderer`
//! - **Repositories**: selection, validation, and fallback on load
//! - **Engine**: best-effort section assembly and error reporting
//! - **Files**: JSON directories with broken entries
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test lesson_generation_integration -- --nocapture
//! ```

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use tandem_lessons::config::LessonConfig;
use tandem_lessons::core::lesson_gen::render::TemplateContext;
use tandem_lessons::core::lesson_gen::sources::LoadErrorKind;
use tandem_lessons::core::lesson_gen::{
    CefrLevel, CulturalGrammarService, GeneratedLesson, InMemoryVocabulary, JsonRecordSource,
    LessonGenerationEngine, LessonGenerationError, LessonGenerationOptions,
    LessonGenerationParams, LessonTemplateRepository, LessonType, SectionType, TemplateRenderer,
    VocabularyItem,
};

// ============================================================================
// Fixtures
// ============================================================================

fn template(id: &str, lesson_type: &str, range: [&str; 2], body: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "description": "integration fixture",
        "type": lesson_type,
        "difficultyRange": range,
        "template": body,
        "variables": [
            { "name": "sectionTitle", "type": "string", "required": true }
        ]
    })
}

fn concept(id: &str, name: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": { "bulgarian": "описание", "german": "Beschreibung" },
        "difficulty": "A1",
        "partOfSpeech": ["noun"],
        "culturalContext": {
            "bulgarianPerspective": "bg",
            "germanPerspective": "de",
            "crossLinguisticExplanation": { "bgToDe": "bg→de", "deToBg": "de→bg" }
        },
        "examples": [
            {
                "bulgarian": "Книгата",
                "german": "Das Buch",
                "explanationBgToDe": "член",
                "explanationDeToBg": "Artikel"
            }
        ],
        "commonMistakes": { "bgToDe": [], "deToBg": [] },
        "relatedConcepts": []
    })
}

fn food_vocabulary() -> InMemoryVocabulary {
    InMemoryVocabulary::new(
        vec![
            VocabularyItem::new("brot", "Brot", "хляб", "noun").with_categories(["food"]),
            VocabularyItem::new("apfel", "Apfel", "ябълка", "noun").with_categories(["food"]),
            VocabularyItem::new("trinken", "trinken", "пия", "verb").with_categories(["food"]),
            VocabularyItem::new("zug", "Zug", "влак", "noun").with_categories(["travel"]),
        ],
    )
    .with_seed(3)
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_each_with_separator_renders_list() {
    let ctx = TemplateContext::new()
        .with("name", "Ana")
        .with("xs", ["a", "b", "c"]);
    let out = TemplateRenderer::new()
        .render_body(
            "Hi {{name}}, items: {{#each xs}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}.",
            &ctx,
        )
        .unwrap();
    assert_eq!(out, "Hi Ana, items: a, b, c.");
}

// ============================================================================
// Repositories
// ============================================================================

#[tokio::test]
async fn test_type_mismatch_raises_generation_error() {
    let repo = LessonTemplateRepository::from_records(
        "fixture",
        vec![template("vocab-b1", "vocabulary", ["B1", "B1"], "# {{sectionTitle}}")],
    );

    let err = repo
        .get_template(LessonType::Grammar, CefrLevel::B1)
        .await
        .unwrap_err();
    assert!(matches!(err, LessonGenerationError::NoTemplate { .. }));
    assert!(repo.get_template(LessonType::Vocabulary, CefrLevel::B1).await.is_ok());
}

#[tokio::test]
async fn test_concept_without_german_name_yields_fallback() {
    let service = CulturalGrammarService::from_records(
        "fixture",
        vec![concept("half-named", json!({ "bulgarian": "Име" }))],
    );

    let concepts = service.get_all_concepts().await;
    assert_eq!(concepts.len(), 1);
    assert_eq!(concepts[0].id, "fallback-article-usage");

    let report = service.load_report().await;
    assert!(report.used_fallback);
    assert_eq!(report.rejected(), 1);
}

#[tokio::test]
async fn test_invalid_concept_dropped_valid_kept() {
    let service = CulturalGrammarService::from_records(
        "fixture",
        vec![
            concept("half-named", json!({ "german": "Name" })),
            concept("complete", json!({ "bulgarian": "Име", "german": "Name" })),
        ],
    );

    let ids: Vec<_> = service
        .get_all_concepts()
        .await
        .iter()
        .map(|c| c.id.clone())
        .collect();
    assert_eq!(ids, vec!["complete"]);
    assert!(!service.load_report().await.used_fallback);
}

// ============================================================================
// Engine
// ============================================================================

#[tokio::test]
async fn test_intro_survives_failed_practice_lookup() {
    // The only template is typed "mixed", so the practice lookup by type fails
    let templates = LessonTemplateRepository::from_records(
        "fixture",
        vec![template(
            "vocabulary-intro",
            "mixed",
            ["A1", "C1"],
            "# {{sectionTitle}}\n{{#each vocabulary}}- {{german}}\n{{/each}}",
        )],
    );
    let engine = LessonGenerationEngine::new(
        Arc::new(templates),
        Arc::new(CulturalGrammarService::from_records("none", Vec::new())),
        Arc::new(food_vocabulary()),
    );
    let params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
        .with_categories(["food"]);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    let ids: Vec<_> = lesson.vocabulary.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["brot", "apfel", "trinken"]);
    assert!(lesson.has_section(SectionType::Introduction));
    assert!(!lesson.has_section(SectionType::Exercise));
    assert_eq!(lesson.skipped_sections.len(), 1);
    assert_eq!(lesson.skipped_sections[0].section, "practice");

    let intro = lesson.section(SectionType::Introduction).unwrap();
    assert_eq!(intro.content, "# Vocabulary: Food\n- Brot\n- Apfel\n- trinken\n");
}

#[tokio::test]
async fn test_lesson_serializes_with_camel_case_fields() {
    let templates = LessonTemplateRepository::from_records(
        "fixture",
        vec![template("vocabulary-intro", "vocabulary", ["A1", "A1"], "# {{sectionTitle}}")],
    );
    let engine = LessonGenerationEngine::new(
        Arc::new(templates),
        Arc::new(CulturalGrammarService::from_records("none", Vec::new())),
        Arc::new(food_vocabulary()),
    );
    let mut params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
        .with_categories(["travel"])
        .with_metadata("includePractice", false);
    params.user_id = Some("learner-1".to_string());

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();
    let value = serde_json::to_value(&lesson).unwrap();

    assert_eq!(value["type"], "vocabulary");
    assert_eq!(value["difficulty"], "A1");
    assert_eq!(value["metadata"]["userId"], "learner-1");
    assert_eq!(value["sections"][0]["type"], "introduction");
    assert!(value["learningObjectives"].is_array());
    assert!(value["skippedSections"].as_array().unwrap().is_empty());
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn test_directory_with_broken_file_keeps_valid_templates() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("intro.json"),
        template("intro", "vocabulary", ["A1", "B2"], "# {{sectionTitle}}").to_string(),
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ \"id\": ").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let repo = LessonTemplateRepository::new(JsonRecordSource::directory(dir.path()));
    let report = repo.load_report().await;

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, LoadErrorKind::ParseError);
    assert!(repo.get_template_by_id("intro").await.is_some());
}

#[tokio::test]
async fn test_missing_directory_falls_back() {
    let dir = TempDir::new().unwrap();
    let repo = LessonTemplateRepository::new(JsonRecordSource::directory(dir.path().join("absent")));

    let all = repo.get_all_templates().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "fallback_template");

    let report = repo.load_report().await;
    assert!(report.used_fallback);
    assert_eq!(report.errors[0].kind, LoadErrorKind::SourceUnavailable);
}

// ============================================================================
// Shipped data
// ============================================================================

/// Default config with data paths resolved against the crate root.
fn shipped_config(seed: Option<u64>) -> LessonConfig {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut config = LessonConfig::default();
    config.data.templates_dir = root.join(&config.data.templates_dir);
    config.data.grammar_file = root.join(&config.data.grammar_file);
    config.data.vocabulary_file = root.join(&config.data.vocabulary_file);
    config.generation.selection_seed = seed;
    config
}

/// Lesson JSON without the per-call ids and timestamps.
fn stable_json(lesson: &GeneratedLesson) -> Value {
    let mut value = serde_json::to_value(lesson).unwrap();
    for key in ["id", "createdAt", "updatedAt"] {
        value.as_object_mut().unwrap().remove(key);
    }
    for section in value["sections"].as_array_mut().unwrap() {
        section.as_object_mut().unwrap().remove("id");
    }
    value
}

#[tokio::test]
async fn test_seeded_engines_generate_identical_lessons() {
    let config = shipped_config(Some(5));
    let first = LessonGenerationEngine::from_config(&config).await.unwrap();
    let second = LessonGenerationEngine::from_config(&config).await.unwrap();

    let requests = [
        LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
            .with_categories(["food"])
            .with_metadata("includeReview", true),
        // no concept at C1, so examples come from a random sample
        LessonGenerationParams::new(LessonType::Grammar, CefrLevel::C1),
        LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1),
    ];
    for params in &requests {
        let options = LessonGenerationOptions::default();
        let a = first.generate_lesson(params, &options).await.unwrap();
        let b = second.generate_lesson(params, &options).await.unwrap();
        assert_eq!(
            serde_json::to_string(&stable_json(&a)).unwrap(),
            serde_json::to_string(&stable_json(&b)).unwrap()
        );
    }
}

#[tokio::test]
async fn test_from_config_fails_without_vocabulary() {
    let mut config = shipped_config(None);
    config.data.vocabulary_file = config.data.vocabulary_file.with_file_name("missing.json");

    assert!(matches!(
        LessonGenerationEngine::from_config(&config).await,
        Err(LessonGenerationError::SourceUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_engine_from_default_config_paths() {
    let engine = LessonGenerationEngine::from_config(&shipped_config(Some(11)))
        .await
        .unwrap();

    for lesson_type in [
        LessonType::Vocabulary,
        LessonType::Grammar,
        LessonType::Mixed,
        LessonType::Cultural,
        LessonType::Contextual,
    ] {
        let params = LessonGenerationParams::new(lesson_type, CefrLevel::A1);
        let lesson = engine
            .generate_lesson(&params, &LessonGenerationOptions::default())
            .await
            .unwrap_or_else(|e| panic!("{lesson_type} lesson failed: {e}"));

        assert_eq!(lesson.lesson_type, lesson_type);
        assert!(!lesson.sections.is_empty());
        assert!(lesson.skipped_sections.is_empty(), "{:?}", lesson.skipped_sections);
        for section in &lesson.sections {
            assert!(!section.content.contains("{{"), "leftover tag in {}", section.title);
        }
    }
}
