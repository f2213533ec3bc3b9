//! Lesson Template Repository
//!
//! Loads lesson templates from a [`RecordSource`] on first use, validates each
//! record, and serves them by `(type, difficulty)` or by id.
//!
//! ## Loading
//!
//! Invalid records are dropped and reported, never fatal. When nothing valid
//! remains (or the source is unavailable) the built-in
//! [`fallback_template`] is used so a lesson can always be produced.
//!
//! ## Selection
//!
//! After loading, every `(type, level)` pair a template's range covers maps to
//! its candidate list. When several templates match, one is chosen uniformly
//! at random; pass a seed for reproducible selection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::instrument;

use super::errors::{DataValidationError, LessonGenerationError};
use super::render::TemplateRenderer;
use super::sources::{LoadError, LoadErrorKind, LoadReport, RawRecord, RecordSource, StaticRecordSource};
use super::types::{CefrLevel, LessonTemplate, LessonType, TemplateVariable, TemplateVariableType};

/// Id of the built-in template used when no template loads.
pub const FALLBACK_TEMPLATE_ID: &str = "fallback_template";

/// The built-in vocabulary template covering every level.
pub fn fallback_template() -> LessonTemplate {
    LessonTemplate {
        id: FALLBACK_TEMPLATE_ID.to_string(),
        name: "Fallback Template".to_string(),
        description: "Fallback template used when no other templates are available".to_string(),
        lesson_type: LessonType::Vocabulary,
        difficulty_range: (CefrLevel::A1, CefrLevel::C1),
        template_body: "# {{sectionTitle}}\n\nThis lesson contains {{count}} vocabulary items.\n\n{{#each vocabulary}}\n- {{german}} / {{bulgarian}}\n{{/each}}".to_string(),
        variables: vec![
            described(TemplateVariable::new("sectionTitle", TemplateVariableType::String, true), "Title for the section"),
            described(TemplateVariable::new("count", TemplateVariableType::Number, true), "Number of vocabulary items"),
            described(TemplateVariable::new("vocabulary", TemplateVariableType::Array, true), "Array of vocabulary items"),
        ],
        example_data: json!({
            "sectionTitle": "Vocabulary",
            "count": 1,
            "vocabulary": [{"german": "Haus", "bulgarian": "къща"}]
        })
        .as_object()
        .cloned(),
    }
}

fn described(mut variable: TemplateVariable, description: &str) -> TemplateVariable {
    variable.description = Some(description.to_string());
    variable
}

type CacheKey = (LessonType, CefrLevel);

/// Immutable state built by the one-time load.
#[derive(Debug)]
struct LoadedTemplates {
    templates: Vec<Arc<LessonTemplate>>,
    by_id: HashMap<String, Arc<LessonTemplate>>,
    candidates: HashMap<CacheKey, Vec<Arc<LessonTemplate>>>,
    report: LoadReport,
}

impl LoadedTemplates {
    fn new(templates: Vec<LessonTemplate>, report: LoadReport) -> Self {
        let templates: Vec<Arc<LessonTemplate>> = templates.into_iter().map(Arc::new).collect();

        let mut by_id = HashMap::with_capacity(templates.len());
        let mut candidates: HashMap<CacheKey, Vec<Arc<LessonTemplate>>> = HashMap::new();
        for template in &templates {
            by_id.insert(template.id.clone(), Arc::clone(template));
            let (start, end) = template.difficulty_range;
            for level in CefrLevel::range(start, end) {
                candidates
                    .entry((template.lesson_type, level))
                    .or_default()
                    .push(Arc::clone(template));
            }
        }

        Self {
            templates,
            by_id,
            candidates,
            report,
        }
    }
}

/// Lazily loaded, read-only store of lesson templates.
pub struct LessonTemplateRepository {
    source: Box<dyn RecordSource>,
    renderer: TemplateRenderer,
    state: OnceCell<LoadedTemplates>,
    rng: Mutex<StdRng>,
}

impl LessonTemplateRepository {
    pub fn new(source: impl RecordSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            renderer: TemplateRenderer::new(),
            state: OnceCell::new(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Repository over in-memory template records.
    pub fn from_records(name: impl Into<String>, records: Vec<serde_json::Value>) -> Self {
        Self::new(StaticRecordSource::new(name, records))
    }

    /// Make candidate selection reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Renderer used to check template bodies at load time.
    pub fn with_renderer(self, renderer: TemplateRenderer) -> Self {
        Self { renderer, ..self }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// Load and index the templates. Later calls are no-ops.
    pub async fn initialize(&self) {
        self.loaded().await;
    }

    /// Summary of the one-time load.
    pub async fn load_report(&self) -> LoadReport {
        self.loaded().await.report.clone()
    }

    /// A template of `lesson_type` whose range covers `difficulty`.
    pub async fn get_template(
        &self,
        lesson_type: LessonType,
        difficulty: CefrLevel,
    ) -> Result<Arc<LessonTemplate>, LessonGenerationError> {
        let loaded = self.loaded().await;
        let candidates = loaded
            .candidates
            .get(&(lesson_type, difficulty))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let selected = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            candidates.choose(&mut *rng).cloned()
        };

        match selected {
            Some(template) => {
                log::debug!(
                    "Selected template '{}' for {lesson_type}/{difficulty} ({} candidates)",
                    template.id,
                    candidates.len()
                );
                Ok(template)
            }
            None => Err(LessonGenerationError::no_template(lesson_type, difficulty)),
        }
    }

    /// Exact lookup, `None` when no template has this id.
    pub async fn get_template_by_id(&self, template_id: &str) -> Option<Arc<LessonTemplate>> {
        self.loaded().await.by_id.get(template_id).cloned()
    }

    pub async fn get_all_templates(&self) -> Vec<Arc<LessonTemplate>> {
        self.loaded().await.templates.clone()
    }

    /// Structural validation of one template. All failed rules are reported together.
    pub fn validate_template(&self, template: &LessonTemplate) -> Result<(), DataValidationError> {
        let mut errors = Vec::new();

        if template.id.trim().is_empty() {
            errors.push("id is required".to_string());
        }
        if template.name.trim().is_empty() {
            errors.push("name is required".to_string());
        }
        if template.description.trim().is_empty() {
            errors.push("description is required".to_string());
        }

        let (start, end) = template.difficulty_range;
        if start > end {
            errors.push(format!("difficultyRange must be ascending, got [{start}, {end}]"));
        }

        if template.template_body.trim().is_empty() {
            errors.push("template body is required".to_string());
        } else if let Err(e) = self.renderer.parse(&template.template_body) {
            errors.push(format!("template body does not parse: {e}"));
        }

        let mut seen = Vec::with_capacity(template.variables.len());
        for variable in &template.variables {
            if variable.name.trim().is_empty() {
                errors.push("variable name is required".to_string());
                continue;
            }
            if seen.contains(&variable.name.as_str()) {
                errors.push(format!("variable '{}' is declared twice", variable.name));
            }
            seen.push(variable.name.as_str());

            if let Some(default) = variable.default_value.as_ref().filter(|d| !d.is_null()) {
                if !variable.var_type.accepts(default) {
                    errors.push(format!(
                        "defaultValue of '{}' must be {}",
                        variable.name, variable.var_type
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DataValidationError::invalid_template(&template.id, errors.join("; ")))
        }
    }

    /// Decode and validate one raw record.
    pub fn decode_template(&self, record: &RawRecord) -> Result<LessonTemplate, DataValidationError> {
        let template: LessonTemplate = serde_json::from_value(record.value.clone()).map_err(|e| {
            DataValidationError::malformed_record(&record.origin, e.to_string())
        })?;
        self.validate_template(&template)?;
        Ok(template)
    }

    async fn loaded(&self) -> &LoadedTemplates {
        self.state.get_or_init(|| self.load()).await
    }

    #[instrument(skip(self), fields(source = %self.source.describe()))]
    async fn load(&self) -> LoadedTemplates {
        let mut report = LoadReport::new(self.source.describe());
        let mut templates: Vec<LessonTemplate> = Vec::new();

        match self.source.fetch().await {
            Ok(batch) => {
                report.files_processed = batch.files_processed;
                report.errors.extend(batch.errors);

                for record in batch.records {
                    report.records_seen += 1;
                    let result = self.decode_template(&record).and_then(|template| {
                        if templates.iter().any(|t| t.id == template.id) {
                            Err(DataValidationError::invalid_template(
                                &template.id,
                                "duplicate template id",
                            ))
                        } else {
                            Ok(template)
                        }
                    });

                    match result {
                        Ok(template) => templates.push(template),
                        Err(e) => {
                            log::warn!(
                                "Skipping template '{}' from {}: {e}",
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
                log::warn!("Template source unavailable: {e}");
                report.errors.push(LoadError::new(
                    self.source.describe(),
                    e.to_string(),
                    LoadErrorKind::SourceUnavailable,
                ));
            }
        }

        report.accepted = templates.len();
        if templates.is_empty() {
            log::warn!("No valid lesson templates found, using fallback template");
            templates.push(fallback_template());
            report.used_fallback = true;
        }

        log::info!(
            "Loaded {} lesson templates from {} ({} rejected, {} load errors)",
            report.accepted,
            report.source,
            report.rejected(),
            report.error_count()
        );
        LoadedTemplates::new(templates, report)
    }
}

impl std::fmt::Debug for LessonTemplateRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LessonTemplateRepository")
            .field("source", &self.source.describe())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
