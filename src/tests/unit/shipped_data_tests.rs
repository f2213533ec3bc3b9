//! Shipped data integrity
//!
//! Every template and grammar concept under `data/` must pass validation,
//! otherwise lessons silently degrade to the fallback records.

use rstest::rstest;

use crate::core::lesson_gen::render::TemplateContext;
use crate::core::lesson_gen::{CefrLevel, GrammarQueryCriteria, LessonType, PartOfSpeech, TemplateRenderer};
use crate::tests::common::*;

#[tokio::test]
async fn test_all_shipped_templates_load() {
    let repo = shipped_templates();
    let report = repo.load_report().await;

    assert_eq!(report.files_processed, 7);
    assert_eq!(report.records_seen, 7);
    assert_eq!(report.accepted, 7);
    assert!(report.is_success(), "unexpected load errors: {:?}", report.errors);
}

#[rstest]
#[case("vocabulary-intro", LessonType::Vocabulary)]
#[case("vocabulary-practice", LessonType::Vocabulary)]
#[case("vocabulary-review", LessonType::Vocabulary)]
#[case("grammar-concept", LessonType::Grammar)]
#[case("grammar-practice", LessonType::Grammar)]
#[case("grammar-comparison", LessonType::Grammar)]
#[case("mixed-lesson", LessonType::Mixed)]
#[tokio::test]
async fn test_shipped_template_ids(#[case] id: &str, #[case] lesson_type: LessonType) {
    let repo = shipped_templates();
    let template = repo.get_template_by_id(id).await.expect("template should exist");
    assert_eq!(template.lesson_type, lesson_type);
    assert!(template.covers(CefrLevel::A1));
    assert!(template.covers(CefrLevel::C1));
}

#[tokio::test]
async fn test_no_shipped_template_for_cultural_type() {
    let repo = shipped_templates();
    assert!(repo.get_template(LessonType::Cultural, CefrLevel::A1).await.is_err());
    assert!(repo.get_template(LessonType::Mixed, CefrLevel::B2).await.is_ok());
}

#[tokio::test]
async fn test_intro_example_data_renders() {
    let repo = shipped_templates();
    let template = repo.get_template_by_id("vocabulary-intro").await.unwrap();
    let data = template.example_data.clone().expect("intro ships example data");

    let out = TemplateRenderer::new()
        .render(&template, &TemplateContext::from(data))
        .unwrap();
    assert!(out.starts_with("# Vocabulary: Food"));
    assert!(out.contains("**Brot** (хляб) *Noun*"));
    assert!(out.contains("DE→BG"));
    assert!(!out.contains("No words matched"));
    assert!(!out.contains("Tip:"));
}

#[tokio::test]
async fn test_all_shipped_concepts_load() {
    let grammar = shipped_grammar();
    let report = grammar.load_report().await;

    assert_eq!(report.accepted, 4);
    assert!(report.is_success(), "unexpected load errors: {:?}", report.errors);
    assert!(grammar.get_concept("fallback-article-usage").await.is_none());
}

#[rstest]
#[case(GrammarQueryCriteria::new().difficulty(CefrLevel::A1), "noun-gender")]
#[case(
    GrammarQueryCriteria::new().difficulty(CefrLevel::A1).part_of_speech(PartOfSpeech::Article),
    "definite-article"
)]
#[case(GrammarQueryCriteria::new().concept_type("dative"), "dative-case")]
#[case(GrammarQueryCriteria::new().concept_type("article-usage"), "noun-gender")]
#[case(GrammarQueryCriteria::new().part_of_speech(PartOfSpeech::Verb), "verb-second-position")]
#[tokio::test]
async fn test_shipped_concept_queries(#[case] criteria: GrammarQueryCriteria, #[case] expected: &str) {
    let grammar = shipped_grammar();
    let found = grammar.query(&criteria).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, expected);
}

#[test]
fn test_shipped_vocabulary_loads() {
    let vocabulary = shipped_vocabulary();
    assert!(vocabulary.len() >= 30);
}
