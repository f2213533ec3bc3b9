//! Cultural Grammar Service
//!
//! Serves bilingual grammar concepts loaded once from a [`RecordSource`].
//! Records that fail validation are skipped; when nothing valid remains the
//! built-in article-usage concept is substituted.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::instrument;

use super::errors::DataValidationError;
use super::sources::{LoadError, LoadErrorKind, LoadReport, RawRecord, RecordSource, StaticRecordSource};
use super::types::{
    BilingualText, CefrLevel, CommonMistakes, CrossLinguisticExplanation, CulturalContext,
    CulturalGrammarConcept, GrammarExample, GrammarQueryCriteria, Metadata, PartOfSpeech,
};

/// Id of the built-in concept used when no concept loads.
pub const FALLBACK_CONCEPT_ID: &str = "fallback-article-usage";

/// Built-in A1 concept on German article usage.
pub fn fallback_concept() -> CulturalGrammarConcept {
    CulturalGrammarConcept {
        id: FALLBACK_CONCEPT_ID.to_string(),
        name: BilingualText::new("Употреба на членове", "Artikelgebrauch"),
        description: BilingualText::new(
            "Основна употреба на членове в немски език",
            "Grundlegender Artikelgebrauch im Deutschen",
        ),
        difficulty: CefrLevel::A1,
        part_of_speech: vec![PartOfSpeech::Noun],
        cultural_context: CulturalContext {
            bulgarian_perspective: "В български няма членове, което създава трудности при изучаването на немски."
                .to_string(),
            german_perspective: "Im Deutschen sind Artikel obligatorisch, was für bulgarische Lernende ungewohnt ist."
                .to_string(),
            cross_linguistic_explanation: CrossLinguisticExplanation {
                bg_to_de: "В български няма членове. В немски трябва да използвате der, die, das според рода."
                    .to_string(),
                de_to_bg: "Im Bulgarischen gibt es keine Artikel. Substantive werden ohne Artikel verwendet."
                    .to_string(),
            },
        },
        examples: vec![GrammarExample {
            bulgarian: "Книгата е на масата.".to_string(),
            german: "Das Buch ist auf dem Tisch.".to_string(),
            explanation_bg_to_de: "В български няма членове. В немски се използват der/die/das.".to_string(),
            explanation_de_to_bg: "Im Deutschen gibt es Artikel (das, dem), im Bulgarischen nicht.".to_string(),
        }],
        common_mistakes: CommonMistakes {
            bg_to_de: vec!["Забравяне на членове".to_string(), "Грешен род".to_string()],
            de_to_bg: vec!["Добавяне на несъществуващи членове".to_string()],
        },
        related_concepts: vec!["noun-gender".to_string()],
        metadata: Metadata::new(),
    }
}

#[derive(Debug)]
struct LoadedConcepts {
    concepts: Vec<Arc<CulturalGrammarConcept>>,
    report: LoadReport,
}

/// Lazily loaded, read-only store of grammar concepts.
pub struct CulturalGrammarService {
    source: Box<dyn RecordSource>,
    state: OnceCell<LoadedConcepts>,
}

impl CulturalGrammarService {
    pub fn new(source: impl RecordSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: OnceCell::new(),
        }
    }

    /// Service over in-memory concept records.
    pub fn from_records(name: impl Into<String>, records: Vec<Value>) -> Self {
        Self::new(StaticRecordSource::new(name, records))
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    pub async fn initialize(&self) {
        self.loaded().await;
    }

    pub async fn load_report(&self) -> LoadReport {
        self.loaded().await.report.clone()
    }

    /// Concepts matching every given criterion, in load order.
    ///
    /// `concept_type` matches a substring of the concept id or an exact
    /// related-concept entry. At most `limit` results are returned; a missing
    /// or zero limit means one.
    pub async fn query(&self, criteria: &GrammarQueryCriteria) -> Vec<Arc<CulturalGrammarConcept>> {
        let limit = criteria.limit.filter(|l| *l > 0).unwrap_or(1);

        let matches: Vec<_> = self
            .loaded()
            .await
            .concepts
            .iter()
            .filter(|concept| criteria.difficulty.map_or(true, |d| concept.difficulty == d))
            .filter(|concept| {
                criteria
                    .part_of_speech
                    .map_or(true, |pos| self.concept_applies_to_part_of_speech(concept, pos))
            })
            .filter(|concept| {
                criteria.concept_type.as_deref().map_or(true, |ct| {
                    concept.id.contains(ct) || concept.related_concepts.iter().any(|r| r == ct)
                })
            })
            .take(limit)
            .cloned()
            .collect();

        log::debug!("Grammar query {criteria:?} matched {} concepts", matches.len());
        matches
    }

    pub async fn get_all_concepts(&self) -> Vec<Arc<CulturalGrammarConcept>> {
        self.loaded().await.concepts.clone()
    }

    pub async fn get_concept(&self, concept_id: &str) -> Option<Arc<CulturalGrammarConcept>> {
        self.loaded()
            .await
            .concepts
            .iter()
            .find(|c| c.id == concept_id)
            .cloned()
    }

    pub fn concept_applies_to_part_of_speech(
        &self,
        concept: &CulturalGrammarConcept,
        pos: PartOfSpeech,
    ) -> bool {
        concept.applies_to(pos)
    }

    /// Structural validation of one concept. All failed rules are reported together.
    pub fn validate_concept(&self, concept: &CulturalGrammarConcept) -> Result<(), DataValidationError> {
        let mut errors = Vec::new();

        if concept.id.trim().is_empty() {
            errors.push("id is required".to_string());
        }
        if !concept.name.is_complete() {
            errors.push("name must have bulgarian and german".to_string());
        }
        if !concept.description.is_complete() {
            errors.push("description must have bulgarian and german".to_string());
        }
        if concept.part_of_speech.is_empty() {
            errors.push("partOfSpeech must be a non-empty array".to_string());
        }
        if concept.examples.is_empty() {
            errors.push("examples must be a non-empty array".to_string());
        }
        for (i, example) in concept.examples.iter().enumerate() {
            if example.bulgarian.trim().is_empty() || example.german.trim().is_empty() {
                errors.push(format!("example {i} must have bulgarian and german"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DataValidationError::invalid_concept(&concept.id, errors.join("; ")))
        }
    }

    /// Decode and validate one raw record.
    pub fn decode_concept(&self, record: &RawRecord) -> Result<CulturalGrammarConcept, DataValidationError> {
        let concept: CulturalGrammarConcept = serde_json::from_value(record.value.clone())
            .map_err(|e| DataValidationError::malformed_record(&record.origin, e.to_string()))?;
        self.validate_concept(&concept)?;
        Ok(concept)
    }

    async fn loaded(&self) -> &LoadedConcepts {
        self.state.get_or_init(|| self.load()).await
    }

    #[instrument(skip(self), fields(source = %self.source.describe()))]
    async fn load(&self) -> LoadedConcepts {
        let mut report = LoadReport::new(self.source.describe());
        let mut concepts = Vec::new();

        match self.source.fetch().await {
            Ok(batch) => {
                report.files_processed = batch.files_processed;
                report.errors.extend(batch.errors);

                for record in batch.records {
                    report.records_seen += 1;
                    match self.decode_concept(&record) {
                        Ok(concept) => concepts.push(Arc::new(concept)),
                        Err(e) => {
                            log::warn!(
                                "Skipping grammar concept '{}' from {}: {e}",
                                record.id().unwrap_or("<no id>"),
                                record.origin
                            );
                            report.errors.push(LoadError::new(
                                record.origin,
                                e.to_string(),
                                LoadErrorKind::ValidationError,
                            ));
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("Grammar source unavailable: {e}");
                report.errors.push(LoadError::new(
                    self.source.describe(),
                    e.to_string(),
                    LoadErrorKind::SourceUnavailable,
                ));
            }
        }

        report.accepted = concepts.len();
        if concepts.is_empty() {
            log::warn!("No valid grammar concepts found, using fallback concept");
            concepts.push(Arc::new(fallback_concept()));
            report.used_fallback = true;
        }

        log::info!(
            "Loaded {} grammar concepts from {} ({} rejected, {} load errors)",
            report.accepted,
            report.source,
            report.rejected(),
            report.error_count()
        );
        LoadedConcepts { concepts, report }
    }
}

impl std::fmt::Debug for CulturalGrammarService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CulturalGrammarService")
            .field("source", &self.source.describe())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
