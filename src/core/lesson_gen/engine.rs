//! Lesson Generation Engine
//!
//! Coordinates the template repository, grammar service, vocabulary provider
//! and renderer to assemble a [`GeneratedLesson`].
//!
//! ## Strategies
//!
//! | Lesson type                         | Strategy    | Sections                          |
//! |-------------------------------------|-------------|-----------------------------------|
//! | `vocabulary`, unspecified           | thematic    | introduction, practice, review    |
//! | `grammar`                           | grammar     | explanation, practice, comparison |
//! | `mixed`, `contextual`, `cultural`   | contextual  | one combined section              |
//!
//! Thematic and grammar lessons are best-effort: a section that fails to
//! render is left out and reported in [`GeneratedLesson::skipped_sections`].
//! A lesson with no sections at all is an error.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::config::{GenerationConfig, LessonConfig};

use super::enrichment::{enrich_items, validated_part_of_speech};
use super::errors::{LessonGenerationError, Result};
use super::grammar_service::CulturalGrammarService;
use super::render::{TemplateContext, TemplateRenderer};
use super::sources::JsonRecordSource;
use super::template_repository::LessonTemplateRepository;
use super::types::{
    CulturalGrammarConcept, GeneratedLesson, GeneratedLessonSection, GrammarQueryCriteria,
    LessonGenerationOptions, LessonGenerationParams, LessonTemplate, LessonType, Metadata,
    SectionType, SkippedSection,
};
use super::vocabulary::{
    InMemoryVocabulary, VocabularyFilter, VocabularyItem, VocabularySearch, VocabularyService,
};

// ============================================================================
// Template ids and section switches
// ============================================================================

const VOCABULARY_INTRO: &str = "vocabulary-intro";
const VOCABULARY_PRACTICE: &str = "vocabulary-practice";
const VOCABULARY_REVIEW: &str = "vocabulary-review";
const GRAMMAR_CONCEPT: &str = "grammar-concept";
const GRAMMAR_PRACTICE: &str = "grammar-practice";
const GRAMMAR_COMPARISON: &str = "grammar-comparison";
const MIXED_LESSON: &str = "mixed-lesson";

const INCLUDE_PRACTICE: &str = "includePractice";
const INCLUDE_REVIEW: &str = "includeReview";
const INCLUDE_COMPARISON: &str = "includeComparison";

const VOCABULARY_TIP: &str = "Focus on the gender of nouns (der, die, das) as you learn them.";
const GRAMMAR_TIP: &str = "Focus on understanding the underlying logic rather than just memorizing rules.";
const CONTEXTUAL_TIP: &str = "Try to narrate a short story using these words.";

// ============================================================================
// Section collection
// ============================================================================

/// Sections that rendered and sections that were left out.
#[derive(Debug, Default)]
struct SectionCollector {
    sections: Vec<GeneratedLessonSection>,
    skipped: Vec<SkippedSection>,
}

impl SectionCollector {
    fn record(&mut self, name: &str, result: Result<GeneratedLessonSection>) {
        match result {
            Ok(section) => self.sections.push(section),
            Err(e) => {
                log::warn!("Skipping {name} section: {e}");
                self.skipped.push(SkippedSection {
                    section: name.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    fn into_parts(
        self,
        lesson_type: LessonType,
    ) -> std::result::Result<(Vec<GeneratedLessonSection>, Vec<SkippedSection>), LessonGenerationError> {
        if self.sections.is_empty() {
            return Err(LessonGenerationError::NoSections {
                lesson_type: lesson_type.to_string(),
                skipped: self.skipped.iter().map(ToString::to_string).collect(),
            });
        }
        Ok((self.sections, self.skipped))
    }
}

/// Everything a strategy produced, before it becomes a lesson.
struct LessonDraft {
    title: String,
    sections: Vec<GeneratedLessonSection>,
    skipped: Vec<SkippedSection>,
    vocabulary: Vec<VocabularyItem>,
    grammar_concepts: Vec<CulturalGrammarConcept>,
    learning_objectives: Vec<String>,
}

// ============================================================================
// Engine
// ============================================================================

/// Generates lessons. Holds no per-request state; safe to share across tasks.
pub struct LessonGenerationEngine {
    templates: Arc<LessonTemplateRepository>,
    grammar: Arc<CulturalGrammarService>,
    vocabulary: Arc<dyn VocabularyService>,
    renderer: TemplateRenderer,
    config: GenerationConfig,
}

impl LessonGenerationEngine {
    pub fn new(
        templates: Arc<LessonTemplateRepository>,
        grammar: Arc<CulturalGrammarService>,
        vocabulary: Arc<dyn VocabularyService>,
    ) -> Self {
        Self {
            templates,
            grammar,
            vocabulary,
            renderer: TemplateRenderer::new(),
            config: GenerationConfig::default(),
        }
    }

    /// Engine over the data files named in `config`.
    ///
    /// `generation.selection_seed` seeds both template selection and
    /// vocabulary sampling. Fails only when the vocabulary file cannot be
    /// read; template and grammar sources load lazily and fall back.
    pub async fn from_config(config: &LessonConfig) -> std::result::Result<Self, LessonGenerationError> {
        let renderer = TemplateRenderer::with_max_depth(config.render.max_nesting_depth);

        let mut templates =
            LessonTemplateRepository::new(JsonRecordSource::directory(&config.data.templates_dir))
                .with_renderer(renderer);
        let grammar = CulturalGrammarService::new(JsonRecordSource::file(&config.data.grammar_file));
        let mut vocabulary = InMemoryVocabulary::load_from_file(&config.data.vocabulary_file).await?;
        if let Some(seed) = config.generation.selection_seed {
            templates = templates.with_seed(seed);
            vocabulary = vocabulary.with_seed(seed);
        }

        Ok(Self::new(Arc::new(templates), Arc::new(grammar), Arc::new(vocabulary))
            .with_config(config.generation.clone())
            .with_renderer(renderer))
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a lesson with the strategy selected by `params.lesson_type`.
    ///
    /// Validation and rendering failures that escape a strategy are reported
    /// as [`LessonGenerationError::Failed`]; generation errors pass through.
    #[instrument(skip_all, fields(lesson_type = %params.effective_type(), difficulty = %params.difficulty))]
    pub async fn generate_lesson(
        &self,
        params: &LessonGenerationParams,
        options: &LessonGenerationOptions,
    ) -> std::result::Result<GeneratedLesson, LessonGenerationError> {
        log::info!(
            "Generating {} lesson at {} (categories: {:?})",
            params.effective_type(),
            params.difficulty,
            params.criteria.categories
        );

        let result = match params.lesson_type {
            Some(LessonType::Grammar) => self.generate_grammar_lesson(params, options).await,
            Some(LessonType::Mixed | LessonType::Contextual | LessonType::Cultural) => {
                self.generate_contextual_lesson(params, options).await
            }
            Some(LessonType::Vocabulary) | None => self.generate_thematic_lesson(params, options).await,
        };

        match result {
            Ok(lesson) => {
                log::info!(
                    "Generated lesson '{}' with {} sections ({} skipped)",
                    lesson.title,
                    lesson.sections.len(),
                    lesson.skipped_sections.len()
                );
                Ok(lesson)
            }
            Err(e) => {
                log::error!("Lesson generation failed: {e}");
                Err(e.into_generation_error())
            }
        }
    }

    /// Vocabulary lesson built around the requested categories.
    pub async fn generate_thematic_lesson(
        &self,
        params: &LessonGenerationParams,
        options: &LessonGenerationOptions,
    ) -> Result<GeneratedLesson> {
        let include_practice = params.flag(INCLUDE_PRACTICE) != Some(false);
        let include_review = params.flag(INCLUDE_REVIEW) == Some(true);

        let vocabulary = self.thematic_vocabulary(params, options).await?;
        let theme = theme_name(&params.criteria.categories);
        let learning_objectives = vec![
            format!("Learn {} new words related to {theme}", vocabulary.len()),
            "Practice pronunciation and usage".to_string(),
        ];

        let mut collector = SectionCollector::default();

        let intro = self
            .vocabulary_intro(params, &vocabulary, &theme, &learning_objectives)
            .await;
        collector.record("introduction", intro);

        if include_practice && !vocabulary.is_empty() {
            let practice = self.vocabulary_practice(params, &vocabulary).await;
            collector.record("practice", practice);
        }

        if include_review {
            let review = self.vocabulary_review(params).await;
            collector.record("review", review);
        }

        let (sections, skipped) = collector.into_parts(params.effective_type())?;
        let categories = if params.criteria.categories.is_empty() {
            "General".to_string()
        } else {
            params.criteria.categories.join(", ")
        };

        Ok(self.assemble(
            params,
            LessonDraft {
                title: format!("Thematic Lesson: {categories}"),
                sections,
                skipped,
                vocabulary,
                grammar_concepts: Vec::new(),
                learning_objectives,
            },
        ))
    }

    /// Lesson focused on one grammar concept with example vocabulary.
    pub async fn generate_grammar_lesson(
        &self,
        params: &LessonGenerationParams,
        _options: &LessonGenerationOptions,
    ) -> Result<GeneratedLesson> {
        let include_practice = params.flag(INCLUDE_PRACTICE) != Some(false);
        let include_comparison = params.flag(INCLUDE_COMPARISON) != Some(false);

        let criteria = GrammarQueryCriteria {
            difficulty: Some(params.difficulty),
            part_of_speech: params.criteria.part_of_speech,
            limit: None,
            concept_type: params.criteria.concept_type.clone(),
        };
        let main_concept = self.grammar.query(&criteria).await.into_iter().next();
        if main_concept.is_none() {
            log::info!("No grammar concept matches {criteria:?}, using generic explanation");
        }

        let numeric_difficulty = params.difficulty.as_number();
        let example_count = self.config.grammar_example_count;
        let examples = match main_concept.as_deref().and_then(|c| c.primary_part_of_speech()) {
            Some(pos) => {
                let search = VocabularySearch::new()
                    .difficulty(numeric_difficulty)
                    .part_of_speech(pos.as_str())
                    .limit(example_count);
                self.vocabulary.search_vocabulary(&search).await?.items
            }
            None => {
                self.vocabulary
                    .random_vocabulary(example_count, &VocabularyFilter::difficulty(numeric_difficulty))
                    .await?
            }
        };

        let concept = main_concept.as_deref();
        let concept_name = concept.map(|c| c.name.german.as_str());

        let mut collector = SectionCollector::default();

        let explanation = self.grammar_explanation(params, concept, &examples).await;
        collector.record("explanation", explanation);

        if let Some(concept) = concept {
            if include_practice {
                let practice = self.grammar_practice(params, concept, &examples).await;
                collector.record("practice", practice);
            }

            if include_comparison {
                match self.templates.get_template_by_id(GRAMMAR_COMPARISON).await {
                    Some(template) => {
                        let comparison = self.grammar_comparison(params, &template, concept);
                        collector.record("comparison", comparison);
                    }
                    None => log::debug!("No '{GRAMMAR_COMPARISON}' template, skipping comparison"),
                }
            }
        }

        let (sections, skipped) = collector.into_parts(params.effective_type())?;

        Ok(self.assemble(
            params,
            LessonDraft {
                title: concept_name.map_or_else(|| "Grammar Lesson".to_string(), |n| format!("Grammar: {n}")),
                sections,
                skipped,
                vocabulary: examples,
                grammar_concepts: concept.cloned().into_iter().collect(),
                learning_objectives: vec![
                    format!("Understand {}", concept_name.unwrap_or("the grammar rule")),
                    "Apply the rule in context".to_string(),
                    "Compare with Bulgarian usage".to_string(),
                ],
            },
        ))
    }

    /// Single-section lesson combining one category's vocabulary with one
    /// grammar concept. Any failure fails the lesson.
    pub async fn generate_contextual_lesson(
        &self,
        params: &LessonGenerationParams,
        options: &LessonGenerationOptions,
    ) -> Result<GeneratedLesson> {
        let template = self
            .template_or_default(MIXED_LESSON, LessonType::Mixed, params)
            .await?;

        let main_concept = self
            .grammar
            .query(&GrammarQueryCriteria::new().difficulty(params.difficulty).limit(1))
            .await
            .into_iter()
            .next();

        let category = params
            .criteria
            .categories
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.default_category.clone());
        let limit = options
            .max_items
            .filter(|n| *n > 0)
            .unwrap_or(self.config.contextual_item_limit);
        let filter = VocabularyFilter::difficulty(params.difficulty.as_number()).limit(limit);
        let vocabulary = self.vocabulary.vocabulary_by_category(&category, &filter).await?;

        let title = format!("Contextual Lesson: {}", capitalize(&category));
        let learning_objectives = vec![
            format!("Master vocabulary related to {category}"),
            main_concept.as_ref().map_or_else(
                || "Practice sentence construction".to_string(),
                |c| format!("Apply {} in context", c.name.german),
            ),
            "Build reading comprehension".to_string(),
        ];

        let mut context = self
            .section_context(params, &title)
            .with("theme", &category)
            .with("difficulty", params.difficulty)
            .with("vocabulary", enrich_items(&vocabulary))
            .with("learningTip", CONTEXTUAL_TIP)
            .with("learningObjectives", &learning_objectives);
        if let Some(concept) = &main_concept {
            context.set("grammarConcept", concept.as_ref());
        }

        let content = self.renderer.render(&template, &context)?;
        let section_type = match params.effective_type() {
            LessonType::Cultural => SectionType::Cultural,
            _ => SectionType::Vocabulary,
        };
        let section = GeneratedLessonSection::new("Main Content", content, section_type)
            .with_metadata("templateId", template.id.clone());

        Ok(self.assemble(
            params,
            LessonDraft {
                title,
                sections: vec![section],
                skipped: Vec::new(),
                vocabulary,
                grammar_concepts: main_concept.map(|c| (*c).clone()).into_iter().collect(),
                learning_objectives,
            },
        ))
    }

    /// Personalised lesson. Currently the thematic strategy.
    pub async fn generate_adaptive_lesson(
        &self,
        params: &LessonGenerationParams,
        options: &LessonGenerationOptions,
    ) -> Result<GeneratedLesson> {
        self.generate_thematic_lesson(params, options).await
    }

    // ========================================================================
    // Vocabulary selection
    // ========================================================================

    async fn thematic_vocabulary(
        &self,
        params: &LessonGenerationParams,
        options: &LessonGenerationOptions,
    ) -> std::result::Result<Vec<VocabularyItem>, LessonGenerationError> {
        let limit = params
            .criteria
            .limit
            .filter(|n| *n > 0)
            .or(options.max_items.filter(|n| *n > 0))
            .unwrap_or(self.config.default_item_limit);
        let numeric_difficulty = params.difficulty.as_number();
        let wanted_pos = params.criteria.part_of_speech.map(|pos| pos.as_str());
        let matches_pos = |item: &VocabularyItem| {
            wanted_pos.map_or(true, |pos| validated_part_of_speech(&item.part_of_speech, &item.id) == pos)
        };

        let categories = &params.criteria.categories;
        let mut items = if !categories.is_empty() {
            let per_category = limit.div_ceil(categories.len());
            let filter = VocabularyFilter::difficulty(numeric_difficulty).limit(per_category);
            let mut items = Vec::new();
            for category in categories {
                let found = self.vocabulary.vocabulary_by_category(category, &filter).await?;
                log::debug!("Category '{category}' returned {} items", found.len());
                items.extend(found.into_iter().filter(|item| matches_pos(item)));
            }
            items
        } else if let Some(pos) = wanted_pos {
            let search = VocabularySearch::new()
                .difficulty(numeric_difficulty)
                .part_of_speech(pos)
                .limit(limit);
            let result = self.vocabulary.search_vocabulary(&search).await?;
            result.items.into_iter().filter(|item| matches_pos(item)).collect()
        } else {
            self.vocabulary
                .random_vocabulary(limit, &VocabularyFilter::difficulty(numeric_difficulty))
                .await?
        };

        items.truncate(limit);
        Ok(items)
    }

    // ========================================================================
    // Sections
    // ========================================================================

    async fn vocabulary_intro(
        &self,
        params: &LessonGenerationParams,
        vocabulary: &[VocabularyItem],
        theme: &str,
        learning_objectives: &[String],
    ) -> Result<GeneratedLessonSection> {
        let template = self
            .template_or_default(VOCABULARY_INTRO, LessonType::Vocabulary, params)
            .await?;
        let title = format!("Vocabulary: {theme}");
        let context = self
            .section_context(params, &title)
            .with("count", vocabulary.len())
            .with("theme", theme)
            .with("difficulty", params.difficulty)
            .with("vocabulary", enrich_items(vocabulary))
            .with("learningTip", VOCABULARY_TIP)
            .with("learningObjectives", learning_objectives);

        let content = self.renderer.render(&template, &context)?;
        Ok(GeneratedLessonSection::new(title, content, SectionType::Introduction)
            .with_metadata("templateId", template.id.clone()))
    }

    async fn vocabulary_practice(
        &self,
        params: &LessonGenerationParams,
        vocabulary: &[VocabularyItem],
    ) -> Result<GeneratedLessonSection> {
        let template = self
            .template_or_default(VOCABULARY_PRACTICE, LessonType::Vocabulary, params)
            .await?;
        let context = self
            .section_context(params, "Practice Exercises")
            .with("instructions", "Test your knowledge of the new words.")
            .with("vocabulary", enrich_items(vocabulary));

        let content = self.renderer.render(&template, &context)?;
        Ok(GeneratedLessonSection::new("Practice", content, SectionType::Exercise)
            .with_metadata("templateId", template.id.clone()))
    }

    /// Review of a separate random sample, standing in for previously studied words.
    async fn vocabulary_review(&self, params: &LessonGenerationParams) -> Result<GeneratedLessonSection> {
        let template = self
            .template_or_default(VOCABULARY_REVIEW, LessonType::Vocabulary, params)
            .await?;
        let review_items = self
            .vocabulary
            .random_vocabulary(
                self.config.review_sample_size,
                &VocabularyFilter::difficulty(params.difficulty.as_number()),
            )
            .await?;
        let context = self
            .section_context(params, "Review")
            .with("context", "Previous Lessons")
            .with("vocabulary", enrich_items(&review_items));

        let content = self.renderer.render(&template, &context)?;
        Ok(GeneratedLessonSection::new("Review", content, SectionType::Summary)
            .with_metadata("templateId", template.id.clone()))
    }

    async fn grammar_explanation(
        &self,
        params: &LessonGenerationParams,
        concept: Option<&CulturalGrammarConcept>,
        examples: &[VocabularyItem],
    ) -> Result<GeneratedLessonSection> {
        let template = self
            .template_or_default(GRAMMAR_CONCEPT, LessonType::Grammar, params)
            .await?;
        let name = concept.map(|c| c.name.german.as_str());
        let title = format!("Grammar: {}", name.unwrap_or("Grammar Rule"));

        let mut context = self
            .section_context(params, &title)
            .with("vocabulary", examples)
            .with("learningTip", GRAMMAR_TIP)
            .with(
                "learningObjectives",
                [
                    format!("Understand the concept of {}", name.unwrap_or("this grammar rule")),
                    format!("Compare {} with Bulgarian usage", name.unwrap_or("it")),
                ],
            );
        if let Some(concept) = concept {
            context.set("grammarConcept", concept);
        }

        let content = self.renderer.render(&template, &context)?;
        let mut section = GeneratedLessonSection::new("Explanation", content, SectionType::Grammar)
            .with_metadata("templateId", template.id.clone());
        if let Some(concept) = concept {
            section = section.with_metadata("conceptId", concept.id.clone());
        }
        Ok(section)
    }

    async fn grammar_practice(
        &self,
        params: &LessonGenerationParams,
        concept: &CulturalGrammarConcept,
        examples: &[VocabularyItem],
    ) -> Result<GeneratedLessonSection> {
        let template = self
            .template_or_default(GRAMMAR_PRACTICE, LessonType::Grammar, params)
            .await?;
        let subset = &examples[..examples.len().min(self.config.grammar_practice_count)];
        let context = self
            .section_context(params, "Grammar Practice")
            .with("grammarConcept", concept)
            .with("vocabulary", subset);

        let content = self.renderer.render(&template, &context)?;
        Ok(GeneratedLessonSection::new("Practice", content, SectionType::Exercise)
            .with_metadata("templateId", template.id.clone()))
    }

    fn grammar_comparison(
        &self,
        params: &LessonGenerationParams,
        template: &LessonTemplate,
        concept: &CulturalGrammarConcept,
    ) -> Result<GeneratedLessonSection> {
        let context = self
            .section_context(params, "Cultural Comparison")
            .with("grammarConcept", concept);

        let content = self.renderer.render(template, &context)?;
        Ok(GeneratedLessonSection::new("Comparison", content, SectionType::Cultural)
            .with_metadata("templateId", template.id.clone()))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// The template with `template_id`, else any template for the type and level.
    async fn template_or_default(
        &self,
        template_id: &str,
        lesson_type: LessonType,
        params: &LessonGenerationParams,
    ) -> Result<Arc<LessonTemplate>> {
        if let Some(template) = self.templates.get_template_by_id(template_id).await {
            return Ok(template);
        }
        log::debug!("Template '{template_id}' not found, selecting by type {lesson_type}");
        Ok(self.templates.get_template(lesson_type, params.difficulty).await?)
    }

    /// Context with the section title and language direction entries.
    fn section_context(&self, params: &LessonGenerationParams, title: &str) -> TemplateContext {
        let mut context: TemplateContext = params.direction.context_entries().into_iter().collect();
        context.set("sectionTitle", title);
        context
    }

    fn assemble(&self, params: &LessonGenerationParams, draft: LessonDraft) -> GeneratedLesson {
        let now = Utc::now();
        let mut metadata: Metadata = params.metadata.clone();
        if let Some(user_id) = &params.user_id {
            metadata
                .entry("userId")
                .or_insert_with(|| Value::String(user_id.clone()));
        }

        GeneratedLesson {
            id: Uuid::new_v4(),
            lesson_type: params.effective_type(),
            difficulty: params.difficulty,
            title: draft.title,
            sections: draft.sections,
            vocabulary: draft.vocabulary,
            grammar_concepts: draft.grammar_concepts,
            learning_objectives: draft.learning_objectives,
            skipped_sections: draft.skipped,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }
}

impl std::fmt::Debug for LessonGenerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonGenerationEngine")
            .field("templates", &self.templates)
            .field("grammar", &self.grammar)
            .field("renderer", &self.renderer)
            .field("config", &self.config)
            .finish()
    }
}

/// Capitalized categories joined with ", ", or "General".
fn theme_name(categories: &[String]) -> String {
    if categories.is_empty() {
        return "General".to_string();
    }
    categories
        .iter()
        .map(|c| capitalize(c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
