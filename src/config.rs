use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    pub data: DataConfig,
    pub generation: GenerationConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

/// Locations of the shipped data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory scanned recursively for template `.json` files.
    pub templates_dir: PathBuf,
    pub grammar_file: PathBuf,
    pub vocabulary_file: PathBuf,
}

/// Tuning of the lesson strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Vocabulary items per thematic lesson when the request names no limit.
    pub default_item_limit: usize,
    /// Size of the separate sample shown in review sections.
    pub review_sample_size: usize,
    /// Example words fetched for a grammar lesson.
    pub grammar_example_count: usize,
    /// How many of those examples the grammar practice section uses.
    pub grammar_practice_count: usize,
    pub contextual_item_limit: usize,
    /// Category used by contextual lessons when none is requested.
    pub default_category: String,
    /// Seed for reproducible template selection and vocabulary sampling.
    pub selection_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Enables the JSON file log when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        let root = PathBuf::from("data");
        Self {
            templates_dir: root.join("templates"),
            grammar_file: root.join("cultural-grammar.json"),
            vocabulary_file: root.join("vocabulary.json"),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_item_limit: 10,
            review_sample_size: 5,
            grammar_example_count: 8,
            grammar_practice_count: 5,
            contextual_item_limit: 8,
            default_category: "travel".to_string(),
            selection_seed: None,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: crate::core::lesson_gen::render::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Where a loaded configuration came from.
///
/// Loading happens before logging is initialized, so the outcome is kept and
/// logged afterwards with [`ConfigOrigin::log`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No readable file; defaults apply.
    Missing(PathBuf),
    /// The file did not parse; defaults apply.
    Invalid { path: PathBuf, error: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("Loaded config from {}", path.display()),
            Self::Missing(path) => {
                log::debug!("No config file at {}, using defaults", path.display())
            }
            Self::Invalid { path, error } => log::warn!(
                "Failed to parse config at {}: {error}, using defaults",
                path.display()
            ),
        }
    }
}

impl LessonConfig {
    /// Load configuration from `~/.config/tandem-lessons/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> (Self, ConfigOrigin) {
        Self::read(&Self::config_path())
    }

    /// Load configuration from an explicit path and log the outcome.
    pub fn load_from(config_path: &Path) -> Self {
        let (config, origin) = Self::read(config_path);
        origin.log();
        config
    }

    /// Read `config_path` without logging, with the same fallbacks as [`LessonConfig::load`].
    pub fn read(config_path: &Path) -> (Self, ConfigOrigin) {
        let path = config_path.to_path_buf();
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, ConfigOrigin::File(path)),
                Err(e) => (
                    Self::default(),
                    ConfigOrigin::Invalid {
                        path,
                        error: e.to_string(),
                    },
                ),
            },
            Err(_) => (Self::default(), ConfigOrigin::Missing(path)),
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("tandem-lessons").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
