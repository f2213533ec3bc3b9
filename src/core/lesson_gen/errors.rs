//! Lesson Generation Error Types
//!
//! Defines the three error kinds of the lesson generation subsystem plus a
//! unified error that wraps them. Uses `thiserror` for ergonomic error handling.
//!
//! - [`DataValidationError`]: a record or rendering context fails structural validation
//! - [`TemplateRenderingError`]: the template language cannot be interpreted
//! - [`LessonGenerationError`]: orchestration failures surfaced to the caller

use thiserror::Error;

// ============================================================================
// Validation Errors
// ============================================================================

/// Errors raised while validating templates, grammar concepts, or rendering data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataValidationError {
    /// Template record failed a structural rule.
    #[error("invalid template '{template_id}': {message}")]
    InvalidTemplate {
        /// The offending template id (may be empty if the id itself is missing).
        template_id: String,
        /// Description of the failed rule(s).
        message: String,
    },

    /// Grammar concept record failed a structural rule.
    #[error("invalid grammar concept '{concept_id}': {message}")]
    InvalidConcept {
        /// The offending concept id.
        concept_id: String,
        /// Description of the failed rule(s).
        message: String,
    },

    /// Raw record could not be decoded into its typed shape.
    #[error("malformed record in {origin}: {message}")]
    MalformedRecord {
        /// Where the record came from (file path or source name).
        origin: String,
        /// Decoder message.
        message: String,
    },

    /// A required template variable is absent from the rendering context.
    #[error("missing required variable '{variable}' for template '{template_id}'")]
    MissingVariable {
        /// Template whose contract was violated.
        template_id: String,
        /// Name of the missing variable.
        variable: String,
    },

    /// A template variable is present but has the wrong type.
    #[error("variable '{variable}' for template '{template_id}' must be {expected}, got {actual}")]
    VariableTypeMismatch {
        /// Template whose contract was violated.
        template_id: String,
        /// Name of the variable.
        variable: String,
        /// Declared type.
        expected: String,
        /// Kind of the supplied value.
        actual: String,
    },
}

impl DataValidationError {
    /// Create a new InvalidTemplate error.
    pub fn invalid_template(template_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template_id: template_id.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidConcept error.
    pub fn invalid_concept(concept_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConcept {
            concept_id: concept_id.into(),
            message: message.into(),
        }
    }

    /// Create a new MalformedRecord error.
    pub fn malformed_record(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Create a new MissingVariable error.
    pub fn missing_variable(template_id: impl Into<String>, variable: impl Into<String>) -> Self {
        Self::MissingVariable {
            template_id: template_id.into(),
            variable: variable.into(),
        }
    }

    /// Create a new VariableTypeMismatch error.
    pub fn type_mismatch(
        template_id: impl Into<String>,
        variable: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::VariableTypeMismatch {
            template_id: template_id.into(),
            variable: variable.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

// ============================================================================
// Rendering Errors
// ============================================================================

/// Errors raised while tokenizing, parsing, or evaluating a template body.
///
/// Line numbers are 1-based and point at the tag that caused the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateRenderingError {
    /// A `{{path}}` could not be resolved in the current scope.
    #[error("undefined variable '{path}' at line {line}")]
    UndefinedVariable { path: String, line: usize },

    /// A plain substitution resolved to an object or array.
    #[error("variable '{path}' at line {line} resolved to {kind}, expected a scalar")]
    NonScalarValue {
        path: String,
        kind: String,
        line: usize,
    },

    /// An `{{#each}}` target resolved to something other than an array.
    #[error("'{path}' at line {line} is {kind}, #each requires an array")]
    NotAnArray {
        path: String,
        kind: String,
        line: usize,
    },

    /// Unparseable tag, stray closer, or unknown block keyword.
    #[error("malformed template at line {line}: {message}")]
    MalformedSyntax { message: String, line: usize },

    /// A block was opened but never closed.
    #[error("unclosed {{{{#{keyword}}}}} block opened at line {line}")]
    UnclosedBlock { keyword: String, line: usize },

    /// Blocks are nested deeper than the renderer allows.
    #[error("block nesting exceeds maximum depth of {max_depth} at line {line}")]
    NestingTooDeep { max_depth: usize, line: usize },
}

impl TemplateRenderingError {
    /// Create a new UndefinedVariable error.
    pub fn undefined(path: impl Into<String>, line: usize) -> Self {
        Self::UndefinedVariable {
            path: path.into(),
            line,
        }
    }

    /// Create a new MalformedSyntax error.
    pub fn malformed(message: impl Into<String>, line: usize) -> Self {
        Self::MalformedSyntax {
            message: message.into(),
            line,
        }
    }

    /// Line the error points at.
    pub fn line(&self) -> usize {
        match self {
            Self::UndefinedVariable { line, .. }
            | Self::NonScalarValue { line, .. }
            | Self::NotAnArray { line, .. }
            | Self::MalformedSyntax { line, .. }
            | Self::UnclosedBlock { line, .. }
            | Self::NestingTooDeep { line, .. } => *line,
        }
    }
}

// ============================================================================
// Generation Errors
// ============================================================================

/// Errors surfaced by the repository, grammar service, and generation engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LessonGenerationError {
    /// No template matches the requested type and difficulty.
    #[error("No template found for type {lesson_type} and difficulty {difficulty}")]
    NoTemplate {
        lesson_type: String,
        difficulty: String,
    },

    /// A raw data source could not be read at all.
    #[error("data source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    /// The vocabulary provider failed.
    #[error("vocabulary provider error: {message}")]
    Vocabulary { message: String },

    /// Every section of a lesson failed to render.
    #[error("no sections could be generated for {lesson_type} lesson ({})", .skipped.join("; "))]
    NoSections {
        lesson_type: String,
        skipped: Vec<String>,
    },

    /// Wrapped failure of a generation strategy.
    #[error("Failed to generate lesson: {message}")]
    Failed { message: String },
}

impl LessonGenerationError {
    /// Create a new NoTemplate error.
    pub fn no_template(lesson_type: impl ToString, difficulty: impl ToString) -> Self {
        Self::NoTemplate {
            lesson_type: lesson_type.to_string(),
            difficulty: difficulty.to_string(),
        }
    }

    /// Create a new SourceUnavailable error.
    pub fn source_unavailable(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a new Vocabulary error.
    pub fn vocabulary(message: impl Into<String>) -> Self {
        Self::Vocabulary {
            message: message.into(),
        }
    }

    /// Create a new Failed error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the lesson generation subsystem.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LessonEngineError {
    /// Validation error.
    #[error(transparent)]
    Validation(#[from] DataValidationError),

    /// Rendering error.
    #[error(transparent)]
    Rendering(#[from] TemplateRenderingError),

    /// Generation error.
    #[error(transparent)]
    Generation(#[from] LessonGenerationError),
}

impl LessonEngineError {
    /// Fold any error into the single error kind reported by `generate_lesson`.
    ///
    /// Generation errors pass through untouched; validation and rendering
    /// errors are wrapped with their original message.
    pub fn into_generation_error(self) -> LessonGenerationError {
        match self {
            Self::Generation(err) => err,
            other => LessonGenerationError::failed(other.to_string()),
        }
    }
}

/// Result type alias for lesson generation operations.
pub type Result<T> = std::result::Result<T, LessonEngineError>;

// ============================================================================
// Tests
// ============================================================================
