//! Vocabulary provider contract and an in-memory implementation.
//!
//! The generation engine only ever reads vocabulary through
//! [`VocabularyService`]. [`InMemoryVocabulary`] serves a loaded item list
//! with the filtering rules of the bundled data loader: exact numeric
//! difficulty, exact part of speech, category membership.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::LessonGenerationError;

/// Default page size for searches without an explicit limit.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

fn default_difficulty() -> u8 {
    1
}

/// A single German/Bulgarian vocabulary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub id: String,
    pub german: String,
    pub bulgarian: String,
    pub part_of_speech: String,
    /// Numeric difficulty, 1 (A1) to 5 (C1).
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Any additional fields carried by the data file (examples, notes, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VocabularyItem {
    pub fn new(
        id: impl Into<String>,
        german: impl Into<String>,
        bulgarian: impl Into<String>,
        part_of_speech: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            german: german.into(),
            bulgarian: bulgarian.into(),
            part_of_speech: part_of_speech.into(),
            difficulty: 1,
            categories: Vec::new(),
            metadata: None,
            extra: Map::new(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Parameters of a filtered vocabulary search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VocabularySearch {
    /// Case-insensitive substring match on either language.
    pub query: Option<String>,
    pub part_of_speech: Option<String>,
    pub difficulty: Option<u8>,
    pub categories: Vec<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl VocabularySearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = Some(pos.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularySearchResult {
    pub items: Vec<VocabularyItem>,
    /// Number of matches before paging.
    pub total: usize,
    pub has_more: bool,
}

/// Filters shared by category lookups and random sampling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VocabularyFilter {
    pub difficulty: Option<u8>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl VocabularyFilter {
    pub fn difficulty(difficulty: u8) -> Self {
        Self {
            difficulty: Some(difficulty),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to the vocabulary store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VocabularyService: Send + Sync {
    /// Filtered, paged search.
    async fn search_vocabulary(
        &self,
        params: &VocabularySearch,
    ) -> Result<VocabularySearchResult, LessonGenerationError>;

    /// Items tagged with `category`, honouring difficulty and limit.
    async fn vocabulary_by_category(
        &self,
        category: &str,
        filter: &VocabularyFilter,
    ) -> Result<Vec<VocabularyItem>, LessonGenerationError>;

    /// Up to `count` items sampled without replacement.
    async fn random_vocabulary(
        &self,
        count: usize,
        filter: &VocabularyFilter,
    ) -> Result<Vec<VocabularyItem>, LessonGenerationError>;
}

// ============================================================================
// In-memory provider
// ============================================================================

/// Vocabulary provider over a fixed item list.
pub struct InMemoryVocabulary {
    items: Vec<VocabularyItem>,
    rng: Mutex<StdRng>,
}

impl InMemoryVocabulary {
    pub fn new(items: Vec<VocabularyItem>) -> Self {
        Self {
            items,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Make random samples reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Decode a JSON array of items, or an object with an `items` array.
    pub fn from_json(value: Value) -> Result<Self, LessonGenerationError> {
        let items = match value {
            Value::Object(mut map) => map.remove("items").unwrap_or(Value::Null),
            other => other,
        };
        let items: Vec<VocabularyItem> = serde_json::from_value(items)
            .map_err(|e| LessonGenerationError::vocabulary(format!("invalid vocabulary data: {e}")))?;
        Ok(Self::new(items))
    }

    /// Load a vocabulary JSON file.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LessonGenerationError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            LessonGenerationError::source_unavailable(path.display().to_string(), e.to_string())
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            LessonGenerationError::vocabulary(format!("{}: {e}", path.display()))
        })?;
        let store = Self::from_json(value)?;
        log::info!(
            "Loaded {} vocabulary items from {}",
            store.items.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn filtered<'a>(&'a self, filter: &'a VocabularyFilter) -> impl Iterator<Item = &'a VocabularyItem> {
        self.items.iter().filter(move |item| {
            filter.difficulty.map_or(true, |d| item.difficulty == d)
                && filter
                    .category
                    .as_deref()
                    .map_or(true, |c| item.in_category(c))
        })
    }
}

#[async_trait]
impl VocabularyService for InMemoryVocabulary {
    async fn search_vocabulary(
        &self,
        params: &VocabularySearch,
    ) -> Result<VocabularySearchResult, LessonGenerationError> {
        let query = params.query.as_deref().map(str::to_lowercase);
        let matches: Vec<&VocabularyItem> = self
            .items
            .iter()
            .filter(|item| {
                query.as_deref().map_or(true, |q| {
                    item.german.to_lowercase().contains(q)
                        || item.bulgarian.to_lowercase().contains(q)
                })
            })
            .filter(|item| {
                params
                    .part_of_speech
                    .as_deref()
                    .map_or(true, |pos| item.part_of_speech == pos)
            })
            .filter(|item| params.difficulty.map_or(true, |d| item.difficulty == d))
            .filter(|item| {
                params.categories.is_empty()
                    || item.categories.iter().any(|c| params.categories.contains(c))
            })
            .collect();

        let total = matches.len();
        let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let items: Vec<VocabularyItem> = matches
            .into_iter()
            .skip(params.offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(VocabularySearchResult {
            items,
            total,
            has_more: params.offset + limit < total,
        })
    }

    async fn vocabulary_by_category(
        &self,
        category: &str,
        filter: &VocabularyFilter,
    ) -> Result<Vec<VocabularyItem>, LessonGenerationError> {
        let items = self
            .filtered(filter)
            .filter(|item| item.in_category(category))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(items)
    }

    async fn random_vocabulary(
        &self,
        count: usize,
        filter: &VocabularyFilter,
    ) -> Result<Vec<VocabularyItem>, LessonGenerationError> {
        let pool: Vec<&VocabularyItem> = self.filtered(filter).collect();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(pool
            .choose_multiple(&mut *rng, count)
            .map(|item| (*item).clone())
            .collect())
    }
}
