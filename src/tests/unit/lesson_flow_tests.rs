//! Strategies over the shipped data.

use crate::core::lesson_gen::{
    CefrLevel, LanguageDirection, LessonGenerationOptions, LessonGenerationParams, LessonType,
    PartOfSpeech, SectionType,
};
use crate::tests::common::*;

#[tokio::test]
async fn test_thematic_food_lesson() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
        .with_categories(["food"]);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(lesson.title, "Thematic Lesson: food");
    assert_eq!(lesson.vocabulary.len(), 8);
    assert!(lesson.vocabulary.iter().all(|v| v.in_category("food") && v.difficulty == 1));
    assert_eq!(
        lesson.sections.iter().map(|s| s.section_type).collect::<Vec<_>>(),
        vec![SectionType::Introduction, SectionType::Exercise]
    );
    assert!(lesson.skipped_sections.is_empty());

    let intro = lesson.section(SectionType::Introduction).unwrap();
    assert!(intro.content.contains("8 words on the theme \"Food\""));
    assert!(intro.content.contains("Learn 8 new words related to Food"));
    assert!(intro.content.contains("Tip: Focus on the gender of nouns"));
}

#[tokio::test]
async fn test_thematic_review_uses_shipped_template() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
        .with_categories(["travel"])
        .with_metadata("includeReview", true)
        .with_metadata("includePractice", false);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    let types: Vec<_> = lesson.sections.iter().map(|s| s.section_type).collect();
    assert_eq!(types, vec![SectionType::Introduction, SectionType::Summary]);
    let review = lesson.section(SectionType::Summary).unwrap();
    assert!(review.content.starts_with("## Review: Previous Lessons"));
    assert_eq!(review.metadata["templateId"], "vocabulary-review");
}

#[tokio::test]
async fn test_corrected_part_of_speech_filters_numbers() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Vocabulary, CefrLevel::A1)
        .with_categories(["numbers"])
        .with_part_of_speech(PartOfSpeech::Number);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    let ids: Vec<_> = lesson.vocabulary.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["eins", "zwei", "drei"]);
    let intro = lesson.section(SectionType::Introduction).unwrap();
    assert!(intro.content.contains("*Numeral*"));
    assert!(!intro.content.contains("*Adjective*"));
}

#[tokio::test]
async fn test_grammar_lesson_over_shipped_concepts() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Grammar, CefrLevel::A1);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(lesson.title, "Grammar: Genus der Substantive");
    assert_eq!(lesson.grammar_concepts.len(), 1);
    assert_eq!(lesson.grammar_concepts[0].id, "noun-gender");
    assert_eq!(lesson.vocabulary.len(), 8);
    assert!(lesson.vocabulary.iter().all(|v| v.part_of_speech == "noun"));

    let types: Vec<_> = lesson.sections.iter().map(|s| s.section_type).collect();
    assert_eq!(
        types,
        vec![SectionType::Grammar, SectionType::Exercise, SectionType::Cultural]
    );
    let explanation = lesson.section(SectionType::Grammar).unwrap();
    assert!(explanation.content.contains("**Genus der Substantive** / **Род на съществителните**"));
    assert!(explanation.content.contains("- der Tisch / масата"));
    assert_eq!(explanation.metadata["conceptId"], "noun-gender");

    let comparison = lesson.section(SectionType::Cultural).unwrap();
    assert!(comparison.content.contains("| Name | Genus der Substantive | Род на съществителните |"));
}

#[tokio::test]
async fn test_grammar_lesson_without_matching_concept() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Grammar, CefrLevel::C1);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(lesson.title, "Grammar Lesson");
    assert!(lesson.grammar_concepts.is_empty());
    assert_eq!(lesson.sections.len(), 1);
    assert!(lesson.sections[0].content.contains("General rules apply"));
}

#[tokio::test]
async fn test_contextual_lesson_defaults_to_travel() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Contextual, CefrLevel::A1)
        .with_direction(LanguageDirection::BulgarianToGerman);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(lesson.title, "Contextual Lesson: Travel");
    assert_eq!(lesson.vocabulary.len(), 8);
    assert_eq!(lesson.sections.len(), 1);

    let section = &lesson.sections[0];
    assert_eq!(section.title, "Main Content");
    assert_eq!(section.section_type, SectionType::Vocabulary);
    assert!(section.content.starts_with("# Contextual Lesson: Travel (BG→DE)"));
    assert!(section.content.contains("## Grammar in context: Genus der Substantive"));
}

#[tokio::test]
async fn test_cultural_lesson_section_type() {
    let engine = shipped_engine();
    let params = LessonGenerationParams::new(LessonType::Cultural, CefrLevel::A1)
        .with_categories(["food"]);

    let lesson = engine
        .generate_lesson(&params, &LessonGenerationOptions::default())
        .await
        .unwrap();

    assert_eq!(lesson.lesson_type, LessonType::Cultural);
    assert_eq!(lesson.sections[0].section_type, SectionType::Cultural);
    assert!(lesson.vocabulary.iter().all(|v| v.in_category("food")));
}
