//! Core data models for lesson generation.
//!
//! Includes:
//! - Enumerations for CEFR levels, lesson types, parts of speech, and section kinds
//! - `LessonTemplate` and its `TemplateVariable` contract
//! - `CulturalGrammarConcept` with its bilingual sub-structures
//! - Generation parameters and the produced `GeneratedLesson` aggregate
//!
//! All records serialize with camelCase field names so they round-trip
//! through the JSON data files unchanged.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::language::LanguageDirection;
use super::vocabulary::VocabularyItem;

/// Free-form metadata attached to lessons, sections, and concepts.
pub type Metadata = Map<String, Value>;

// ============================================================================
// CEFR Level
// ============================================================================

/// CEFR proficiency tier, the difficulty axis of every lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl CefrLevel {
    /// All levels in ascending order.
    pub const ALL: [CefrLevel; 5] = [Self::A1, Self::A2, Self::B1, Self::B2, Self::C1];

    /// Numeric difficulty used by the vocabulary provider (A1 = 1 … C1 = 5).
    pub fn as_number(self) -> u8 {
        match self {
            Self::A1 => 1,
            Self::A2 => 2,
            Self::B1 => 3,
            Self::B2 => 4,
            Self::C1 => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
        }
    }

    /// Levels from `start` to `end` inclusive. Empty when `start > end`.
    pub fn range(start: CefrLevel, end: CefrLevel) -> impl Iterator<Item = CefrLevel> {
        Self::ALL
            .into_iter()
            .filter(move |level| *level >= start && *level <= end)
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            other => Err(format!("unknown CEFR level: {other}")),
        }
    }
}

// ============================================================================
// Lesson Type
// ============================================================================

/// Generation strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Vocabulary,
    Grammar,
    Mixed,
    #[serde(alias = "culture")]
    Cultural,
    Contextual,
}

impl LessonType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Grammar => "grammar",
            Self::Mixed => "mixed",
            Self::Cultural => "cultural",
            Self::Contextual => "contextual",
        }
    }
}

impl fmt::Display for LessonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocabulary" => Ok(Self::Vocabulary),
            "grammar" => Ok(Self::Grammar),
            "mixed" => Ok(Self::Mixed),
            "cultural" | "culture" => Ok(Self::Cultural),
            "contextual" => Ok(Self::Contextual),
            other => Err(format!("unknown lesson type: {other}")),
        }
    }
}

// ============================================================================
// Part of Speech
// ============================================================================

/// Fixed part-of-speech enumeration shared by vocabulary, grammar concepts
/// and query criteria. `numeral` is read as [`PartOfSpeech::Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    Interjection,
    Article,
    #[serde(alias = "numeral")]
    Number,
    Phrase,
}

impl PartOfSpeech {
    pub const ALL: [PartOfSpeech; 11] = [
        Self::Noun,
        Self::Verb,
        Self::Adjective,
        Self::Adverb,
        Self::Preposition,
        Self::Conjunction,
        Self::Pronoun,
        Self::Interjection,
        Self::Article,
        Self::Number,
        Self::Phrase,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Preposition => "preposition",
            Self::Conjunction => "conjunction",
            Self::Pronoun => "pronoun",
            Self::Interjection => "interjection",
            Self::Article => "article",
            Self::Number => "number",
            Self::Phrase => "phrase",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartOfSpeech {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "numeral" {
            return Ok(Self::Number);
        }
        Self::ALL
            .into_iter()
            .find(|pos| pos.as_str() == wanted)
            .ok_or_else(|| format!("Invalid part of speech: {s}"))
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Declared type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariableType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl TemplateVariableType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Type predicate used by data validation.
    ///
    /// Numbers must be finite; objects exclude arrays and null.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Number, Value::Number(n)) => n.as_f64().map_or(false, |f| !f.is_nan()),
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TemplateVariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable a template expects in its rendering context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: TemplateVariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl TemplateVariable {
    pub fn new(name: impl Into<String>, var_type: TemplateVariableType, required: bool) -> Self {
        Self {
            name: name.into(),
            var_type,
            description: None,
            required,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// A reusable lesson template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub difficulty_range: (CefrLevel, CefrLevel),
    #[serde(rename = "template", alias = "templateBody")]
    pub template_body: String,
    pub variables: Vec<TemplateVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_data: Option<Metadata>,
}

impl LessonTemplate {
    /// Whether `difficulty` falls inside the template's range.
    pub fn covers(&self, difficulty: CefrLevel) -> bool {
        let (start, end) = self.difficulty_range;
        difficulty >= start && difficulty <= end
    }

    pub fn variable(&self, name: &str) -> Option<&TemplateVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

// ============================================================================
// Grammar Concepts
// ============================================================================

/// A mandatory German/Bulgarian text pair.
///
/// Missing halves decode as empty strings so validation can name them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilingualText {
    pub bulgarian: String,
    pub german: String,
}

impl BilingualText {
    pub fn new(bulgarian: impl Into<String>, german: impl Into<String>) -> Self {
        Self {
            bulgarian: bulgarian.into(),
            german: german.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.bulgarian.trim().is_empty() && !self.german.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossLinguisticExplanation {
    pub bg_to_de: String,
    pub de_to_bg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalContext {
    pub bulgarian_perspective: String,
    pub german_perspective: String,
    pub cross_linguistic_explanation: CrossLinguisticExplanation,
}

/// A worked bilingual example with explanations for both learning directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrammarExample {
    pub bulgarian: String,
    pub german: String,
    pub explanation_bg_to_de: String,
    pub explanation_de_to_bg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonMistakes {
    pub bg_to_de: Vec<String>,
    pub de_to_bg: Vec<String>,
}

/// A bilingual explanation of one grammatical rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalGrammarConcept {
    pub id: String,
    pub name: BilingualText,
    pub description: BilingualText,
    pub difficulty: CefrLevel,
    pub part_of_speech: Vec<PartOfSpeech>,
    pub cultural_context: CulturalContext,
    pub examples: Vec<GrammarExample>,
    pub common_mistakes: CommonMistakes,
    pub related_concepts: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl CulturalGrammarConcept {
    pub fn applies_to(&self, pos: PartOfSpeech) -> bool {
        self.part_of_speech.contains(&pos)
    }

    pub fn primary_part_of_speech(&self) -> Option<PartOfSpeech> {
        self.part_of_speech.first().copied()
    }
}

/// Filter for `CulturalGrammarService::query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarQueryCriteria {
    pub difficulty: Option<CefrLevel>,
    pub part_of_speech: Option<PartOfSpeech>,
    pub limit: Option<usize>,
    pub concept_type: Option<String>,
}

impl GrammarQueryCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn difficulty(mut self, difficulty: CefrLevel) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn part_of_speech(mut self, pos: PartOfSpeech) -> Self {
        self.part_of_speech = Some(pos);
        self
    }

    pub fn concept_type(mut self, concept_type: impl Into<String>) -> Self {
        self.concept_type = Some(concept_type.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// Generation Parameters
// ============================================================================

/// Filters narrowing the content of a lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonCriteria {
    pub categories: Vec<String>,
    pub part_of_speech: Option<PartOfSpeech>,
    pub difficulty: Option<CefrLevel>,
    pub limit: Option<usize>,
    pub concept_type: Option<String>,
}

/// Caller-supplied description of the lesson to generate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonGenerationParams {
    /// Strategy selector. `None` generates a thematic vocabulary lesson.
    #[serde(rename = "type", default)]
    pub lesson_type: Option<LessonType>,
    pub difficulty: CefrLevel,
    #[serde(default)]
    pub criteria: LessonCriteria,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub direction: LanguageDirection,
    /// Section switches (`includePractice`, `includeReview`, `includeComparison`)
    /// and arbitrary caller data copied onto the lesson.
    #[serde(default)]
    pub metadata: Metadata,
}

impl LessonGenerationParams {
    pub fn new(lesson_type: LessonType, difficulty: CefrLevel) -> Self {
        Self {
            lesson_type: Some(lesson_type),
            difficulty,
            criteria: LessonCriteria::default(),
            user_id: None,
            direction: LanguageDirection::default(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.criteria.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_part_of_speech(mut self, pos: PartOfSpeech) -> Self {
        self.criteria.part_of_speech = Some(pos);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.criteria.limit = Some(limit);
        self
    }

    pub fn with_concept_type(mut self, concept_type: impl Into<String>) -> Self {
        self.criteria.concept_type = Some(concept_type.into());
        self
    }

    pub fn with_direction(mut self, direction: LanguageDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Boolean switch stored in metadata, `None` when absent or not a bool.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }

    /// The lesson type actually generated.
    pub fn effective_type(&self) -> LessonType {
        self.lesson_type.unwrap_or(LessonType::Vocabulary)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalizationLevel {
    Low,
    Medium,
    High,
}

/// Tuning knobs for the generation algorithm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonGenerationOptions {
    pub use_spaced_repetition: Option<bool>,
    pub difficulty_adjustment: Option<bool>,
    pub cultural_context: Option<bool>,
    pub personalization_level: Option<PersonalizationLevel>,
    pub max_items: Option<usize>,
}

impl LessonGenerationOptions {
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }
}

// ============================================================================
// Generated Lessons
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Introduction,
    Vocabulary,
    Grammar,
    Exercise,
    Summary,
    Cultural,
}

/// One rendered, titled part of a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLessonSection {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GeneratedLessonSection {
    pub fn new(title: impl Into<String>, content: String, section_type: SectionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content,
            section_type,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A section a strategy attempted but had to leave out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedSection {
    pub section: String,
    pub reason: String,
}

impl fmt::Display for SkippedSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.section, self.reason)
    }
}

/// The lesson produced by one generation call. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLesson {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub lesson_type: LessonType,
    pub difficulty: CefrLevel,
    pub title: String,
    pub sections: Vec<GeneratedLessonSection>,
    pub vocabulary: Vec<VocabularyItem>,
    pub grammar_concepts: Vec<CulturalGrammarConcept>,
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub skipped_sections: Vec<SkippedSection>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GeneratedLesson {
    pub fn section(&self, section_type: SectionType) -> Option<&GeneratedLessonSection> {
        self.sections.iter().find(|s| s.section_type == section_type)
    }

    pub fn has_section(&self, section_type: SectionType) -> bool {
        self.section(section_type).is_some()
    }
}
