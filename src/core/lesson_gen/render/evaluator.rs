//! Single-pass evaluation of a parsed template against a scope chain.

use serde_json::Value;

use crate::core::lesson_gen::errors::TemplateRenderingError;

use super::context::{is_truthy, stringify_scalar, value_kind, Scope};
use super::parser::Node;

/// Append the rendering of `nodes` in `scope` to `out`.
///
/// Substituted values are emitted verbatim and never re-interpreted as
/// template syntax.
pub fn evaluate(nodes: &[Node], scope: &Scope<'_>, out: &mut String) -> Result<(), TemplateRenderingError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable { path, line } => {
                let value = scope
                    .resolve(path)
                    .ok_or_else(|| TemplateRenderingError::undefined(path.as_str(), *line))?;
                let text = stringify_scalar(&value).ok_or_else(|| {
                    TemplateRenderingError::NonScalarValue {
                        path: path.clone(),
                        kind: value_kind(&value).to_string(),
                        line: *line,
                    }
                })?;
                out.push_str(&text);
            }
            Node::Conditional {
                negated,
                path,
                then,
                otherwise,
                ..
            } => {
                let truthy = is_truthy(scope.resolve(path).as_deref());
                let branch = if truthy != *negated { then } else { otherwise };
                evaluate(branch, scope, out)?;
            }
            Node::Each { path, line, body } => {
                let Some(target) = scope.resolve(path) else {
                    log::debug!("#each target '{path}' is undefined, rendering empty block");
                    continue;
                };
                let Value::Array(items) = target.as_ref() else {
                    return Err(TemplateRenderingError::NotAnArray {
                        path: path.clone(),
                        kind: value_kind(&target).to_string(),
                        line: *line,
                    });
                };
                for (index, item) in items.iter().enumerate() {
                    let child = Scope::iteration(item, index, items.len(), scope);
                    evaluate(body, &child, out)?;
                }
            }
        }
    }
    Ok(())
}
