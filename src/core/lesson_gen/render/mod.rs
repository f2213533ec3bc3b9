//! Template Rendering
//!
//! A small logic-light template language for lesson content:
//!
//! - `{{name}}` / `{{a.b.c}}`: scalar substitution; unresolved names are errors
//! - `{{#if x}}…{{else}}…{{/if}}` and `{{#unless x}}…{{/unless}}`
//! - `{{#each list}}…{{/each}}` with `this`, `@index`, `@first`, `@last`
//!
//! Rendering is three stages: [`lexer`] produces a flat token stream,
//! [`parser`] builds a block tree, [`evaluator`] walks the tree once.
//!
//! # Example
//!
//! ```rust
//! use tandem_lessons::core::lesson_gen::render::{TemplateContext, TemplateRenderer};
//!
//! let renderer = TemplateRenderer::new();
//! let ctx = TemplateContext::new()
//!     .with("name", "Ana")
//!     .with("xs", ["a", "b", "c"]);
//! let out = renderer
//!     .render_body("Hi {{name}}: {{#each xs}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}", &ctx)
//!     .unwrap();
//! assert_eq!(out, "Hi Ana: a, b, c");
//! ```

pub mod context;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use context::{is_truthy, stringify_scalar, value_kind, Scope, TemplateContext};
pub use parser::{Node, ParsedTemplate};

use serde_json::Map;

use super::errors::{DataValidationError, Result, TemplateRenderingError};
use super::types::LessonTemplate;

/// Default maximum block nesting depth.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 20;

/// Renders lesson templates against a [`TemplateContext`].
///
/// Stateless and deterministic: the same template and context always
/// produce the same output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRenderer {
    max_depth: usize,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validate `context` against the template's declared variables, then
    /// render the template body.
    ///
    /// Optional variables that are absent from the context render with
    /// their declared `defaultValue`.
    pub fn render(&self, template: &LessonTemplate, context: &TemplateContext) -> Result<String> {
        self.validate_data(template, context)?;

        let defaults: Map<String, serde_json::Value> = template
            .variables
            .iter()
            .filter(|v| !context.contains(&v.name))
            .filter_map(|v| v.default_value.clone().map(|d| (v.name.clone(), d)))
            .collect();

        let parsed = self.parse(&template.template_body)?;
        let base = Scope::root(&defaults);
        let scope = Scope::layered(context.as_map(), &base);

        let mut out = String::with_capacity(template.template_body.len());
        evaluator::evaluate(parsed.nodes(), &scope, &mut out)?;

        log::debug!(
            "Rendered template '{}' ({} bytes)",
            template.id,
            out.len()
        );
        Ok(out)
    }

    /// Render a raw template body without a variable contract.
    pub fn render_body(
        &self,
        body: &str,
        context: &TemplateContext,
    ) -> std::result::Result<String, TemplateRenderingError> {
        let parsed = self.parse(body)?;
        let mut out = String::with_capacity(body.len());
        evaluator::evaluate(parsed.nodes(), &Scope::root(context.as_map()), &mut out)?;
        Ok(out)
    }

    pub fn parse(&self, body: &str) -> std::result::Result<ParsedTemplate, TemplateRenderingError> {
        ParsedTemplate::parse(body, self.max_depth)
    }

    /// Check every declared variable: required ones must be present and
    /// present ones must match their declared type.
    pub fn validate_data(
        &self,
        template: &LessonTemplate,
        context: &TemplateContext,
    ) -> std::result::Result<(), DataValidationError> {
        for variable in &template.variables {
            match context.get(&variable.name) {
                None if variable.required => {
                    return Err(DataValidationError::missing_variable(
                        &template.id,
                        &variable.name,
                    ));
                }
                None => {}
                Some(value) if !variable.var_type.accepts(value) => {
                    return Err(DataValidationError::type_mismatch(
                        &template.id,
                        &variable.name,
                        variable.var_type.as_str(),
                        value_kind(value),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Structural check of a template: the body must be non-empty and parse.
    pub fn validate_template(&self, template: &LessonTemplate) -> Result<()> {
        if template.template_body.trim().is_empty() {
            return Err(DataValidationError::invalid_template(
                &template.id,
                "template body is required and must be a non-empty string",
            )
            .into());
        }
        self.parse(&template.template_body)?;
        Ok(())
    }
}
