//! Property-based tests for the template renderer
//!
//! Tests invariants:
//! - Text without tags renders unchanged
//! - `#if` / `#unless` over the same value render exactly one branch
//! - `#each` renders every element in order with its index
//! - Values containing tag syntax are emitted verbatim
//! - No tag delimiters remain in the output
//! - Same template and context always give the same output

use proptest::prelude::*;
use serde_json::{json, Value};

use crate::core::lesson_gen::render::{is_truthy, TemplateContext, TemplateRenderer};

// ============================================================================
// Strategies for generating test inputs
// ============================================================================

/// Text that contains no tag delimiters or escapes
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,:;!?\n-]{0,200}"
}

/// Short words used as array elements
fn arb_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{1,8}", 0..12)
}

/// Any JSON value a condition might see
fn arb_condition_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z0-9]{0,6}".prop_map(Value::String),
        Just(json!("false")),
        Just(json!("0")),
        Just(json!([])),
        Just(json!({})),
        arb_words().prop_map(|w| json!(w)),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Text without tags renders unchanged
    #[test]
    fn prop_plain_text_is_identity(text in arb_plain_text()) {
        let out = TemplateRenderer::new()
            .render_body(&text, &TemplateContext::new())
            .unwrap();
        prop_assert_eq!(out, text);
    }

    /// Property: Exactly one of the complementary branches renders
    #[test]
    fn prop_if_unless_are_complements(value in arb_condition_value()) {
        let ctx = TemplateContext::new().with("flag", value.clone());
        let out = TemplateRenderer::new()
            .render_body("{{#if flag}}A{{/if}}{{#unless flag}}B{{/unless}}", &ctx)
            .unwrap();

        let expected = if is_truthy(ctx.get("flag")) { "A" } else { "B" };
        prop_assert_eq!(out, expected);
    }

    /// Property: `else` renders exactly when the `if` branch does not
    #[test]
    fn prop_if_else_matches_unless(value in arb_condition_value()) {
        let ctx = TemplateContext::new().with("flag", value);
        let renderer = TemplateRenderer::new();
        let with_else = renderer
            .render_body("{{#if flag}}yes{{else}}no{{/if}}", &ctx)
            .unwrap();
        let with_unless = renderer
            .render_body("{{#if flag}}yes{{/if}}{{#unless flag}}no{{/unless}}", &ctx)
            .unwrap();
        prop_assert_eq!(with_else, with_unless);
    }

    /// Property: Each visits every element in order
    #[test]
    fn prop_each_visits_all_elements(words in arb_words()) {
        let ctx = TemplateContext::new().with("xs", &words);
        let out = TemplateRenderer::new()
            .render_body("{{#each xs}}{{@index}}={{this}};{{/each}}", &ctx)
            .unwrap();

        let expected: String = words
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{i}={w};"))
            .collect();
        prop_assert_eq!(out, expected);
    }

    /// Property: Separators placed with `@last` join like `join`
    #[test]
    fn prop_each_last_joins(words in arb_words()) {
        let ctx = TemplateContext::new().with("xs", &words);
        let out = TemplateRenderer::new()
            .render_body("{{#each xs}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}", &ctx)
            .unwrap();
        prop_assert_eq!(out, words.join(", "));
    }

    /// Property: Substituted values are emitted verbatim
    #[test]
    fn prop_values_not_reinterpreted(value in "[a-z{}#/ ]{0,40}") {
        let ctx = TemplateContext::new()
            .with("v", &value)
            .with("x", "SHOULD-NOT-APPEAR");
        let out = TemplateRenderer::new().render_body("<{{v}}>", &ctx).unwrap();
        prop_assert_eq!(out, format!("<{value}>"));
    }

    /// Property: No tag survives rendering of brace-free data
    #[test]
    fn prop_no_leftover_tokens(words in arb_words(), title in arb_plain_text()) {
        let ctx = TemplateContext::new().with("xs", &words).with("title", &title);
        let out = TemplateRenderer::new()
            .render_body("# {{ title }}\n{{#each xs}}{{#if @first}}*{{/if}}{{this}}\n{{/each}}", &ctx)
            .unwrap();
        prop_assert!(!out.contains("{{"));
        prop_assert!(!out.contains("}}"));
    }

    /// Property: Rendering is deterministic
    #[test]
    fn prop_rendering_is_deterministic(words in arb_words(), flag in any::<bool>()) {
        let ctx = TemplateContext::new().with("xs", &words).with("flag", flag);
        let template = "{{#if flag}}[{{/if}}{{#each xs}}{{this}}{{#if @first}}!{{/if}}{{/each}}";
        let renderer = TemplateRenderer::new();
        let first = renderer.render_body(template, &ctx).unwrap();
        let second = renderer.render_body(template, &ctx).unwrap();
        prop_assert_eq!(first, second);
    }
}
