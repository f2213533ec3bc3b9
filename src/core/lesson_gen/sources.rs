//! Raw Record Sources
//!
//! Templates and grammar concepts are persisted as JSON records. A
//! [`RecordSource`] fetches every candidate record as untyped JSON; the
//! owning store decodes and validates each one and drops the invalid ones.
//!
//! ## Features
//!
//! - Loads `.json` files from a directory tree or a single file
//! - A file may hold one record, an array of records, or an object with a
//!   `templates` / `concepts` array
//! - Unreadable or unparseable files are reported, loading continues
//! - In-memory sources for embedding and tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_lessons::core::lesson_gen::sources::JsonRecordSource;
//!
//! let templates = JsonRecordSource::directory("data/templates");
//! let grammar = JsonRecordSource::file("data/cultural-grammar.json");
//! let batch = templates.fetch().await?;
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::LessonGenerationError;

// ============================================================================
// Constants
// ============================================================================

/// Object keys whose array value is treated as a list of records.
const COLLECTION_KEYS: [&str; 2] = ["templates", "concepts"];

const JSON_EXTENSION: &str = "json";

// ============================================================================
// Records and Reports
// ============================================================================

/// An undecoded record and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// File path (with `#index` for array members) or source name.
    pub origin: String,
    pub value: Value,
}

impl RawRecord {
    pub fn new(origin: impl Into<String>, value: Value) -> Self {
        Self {
            origin: origin.into(),
            value,
        }
    }

    /// The record's `id` field, if it has a string one.
    pub fn id(&self) -> Option<&str> {
        self.value.get("id").and_then(Value::as_str)
    }
}

/// Everything a source produced in one fetch.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub records: Vec<RawRecord>,
    /// Files that could not be read or parsed.
    pub errors: Vec<LoadError>,
    pub files_processed: usize,
}

/// Categories of loading errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadErrorKind {
    /// File could not be read.
    IoError,
    /// JSON parsing failed.
    ParseError,
    /// Record decoded but failed validation, or could not be decoded.
    ValidationError,
    /// The whole source was unavailable.
    SourceUnavailable,
}

/// A file or record that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadError {
    pub origin: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub kind: LoadErrorKind,
}

impl LoadError {
    pub fn new(origin: impl Into<String>, message: impl Into<String>, kind: LoadErrorKind) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
            line: None,
            kind,
        }
    }
}

/// Summary of a store's one-time load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Description of the source that was read.
    pub source: String,
    pub files_processed: usize,
    pub records_seen: usize,
    /// Records that passed validation.
    pub accepted: usize,
    pub errors: Vec<LoadError>,
    /// Whether the built-in fallback record was substituted.
    pub used_fallback: bool,
}

impl LoadReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            files_processed: 0,
            records_seen: 0,
            accepted: 0,
            errors: Vec::new(),
            used_fallback: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && !self.used_fallback
    }

    pub fn rejected(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.kind == LoadErrorKind::ValidationError)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

// ============================================================================
// Record Source
// ============================================================================

/// A persisted collection of JSON records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Human-readable description used in logs and reports.
    fn describe(&self) -> String;

    /// Fetch every candidate record.
    ///
    /// Returns an error only when the source as a whole is unavailable;
    /// per-file failures go into [`SourceBatch::errors`].
    async fn fetch(&self) -> Result<SourceBatch, LessonGenerationError>;
}

/// Fixed in-memory records.
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    name: String,
    values: Vec<Value>,
}

impl StaticRecordSource {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self) -> Result<SourceBatch, LessonGenerationError> {
        Ok(SourceBatch {
            records: self
                .values
                .iter()
                .enumerate()
                .map(|(i, value)| RawRecord::new(format!("{}[{i}]", self.name), value.clone()))
                .collect(),
            errors: Vec::new(),
            files_processed: 0,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Directory,
    File,
}

/// JSON files on disk.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
    layout: Layout,
}

impl JsonRecordSource {
    /// Every `.json` file below `dir`, visited in sorted order.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into(),
            layout: Layout::Directory,
        }
    }

    /// A single JSON file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: Layout::File,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn collect_files(&self) -> Result<Vec<PathBuf>, LessonGenerationError> {
        let mut files = Vec::new();
        let mut pending = vec![self.path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
                LessonGenerationError::source_unavailable(dir.display().to_string(), e.to_string())
            })?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                LessonGenerationError::source_unavailable(dir.display().to_string(), e.to_string())
            })? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| {
                    LessonGenerationError::source_unavailable(path.display().to_string(), e.to_string())
                })?;
                if file_type.is_symlink() {
                    log::debug!("Skipping symlink {}", path.display());
                } else if file_type.is_dir() {
                    pending.push(path);
                } else if is_json_file(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read_file(path: &Path, batch: &mut SourceBatch) {
        batch.files_processed += 1;
        let origin = path.display().to_string();

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read {origin}: {e}");
                batch
                    .errors
                    .push(LoadError::new(origin, e.to_string(), LoadErrorKind::IoError));
                return;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => batch.records.extend(split_records(&origin, value)),
            Err(e) => {
                log::warn!("Failed to parse {origin}: {e}");
                let mut error = LoadError::new(origin, e.to_string(), LoadErrorKind::ParseError);
                error.line = Some(e.line());
                batch.errors.push(error);
            }
        }
    }
}

#[async_trait]
impl RecordSource for JsonRecordSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<SourceBatch, LessonGenerationError> {
        let mut batch = SourceBatch::default();

        let metadata = tokio::fs::metadata(&self.path).await.ok();
        match self.layout {
            Layout::File => {
                if !metadata.as_ref().is_some_and(|m| m.is_file()) {
                    return Err(LessonGenerationError::source_unavailable(
                        self.describe(),
                        "file does not exist",
                    ));
                }
                Self::read_file(&self.path, &mut batch).await;
            }
            Layout::Directory => {
                if !metadata.as_ref().is_some_and(|m| m.is_dir()) {
                    return Err(LessonGenerationError::source_unavailable(
                        self.describe(),
                        "directory does not exist",
                    ));
                }
                for file in self.collect_files().await? {
                    Self::read_file(&file, &mut batch).await;
                }
            }
        }

        log::debug!(
            "Fetched {} records from {} ({} files, {} errors)",
            batch.records.len(),
            self.describe(),
            batch.files_processed,
            batch.errors.len()
        );
        Ok(batch)
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(JSON_EXTENSION))
}

/// Split a parsed file into records.
fn split_records(origin: &str, value: Value) -> Vec<RawRecord> {
    let members = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = COLLECTION_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array));
            match key.and_then(|key| map.remove(*key)) {
                Some(Value::Array(items)) => items,
                _ => return vec![RawRecord::new(origin, Value::Object(map))],
            }
        }
        other => return vec![RawRecord::new(origin, other)],
    };

    members
        .into_iter()
        .enumerate()
        .map(|(i, value)| RawRecord::new(format!("{origin}#{i}"), value))
        .collect()
}
