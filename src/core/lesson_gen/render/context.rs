//! Rendering context and scope resolution.
//!
//! A [`TemplateContext`] is the caller-supplied key/value map. During
//! evaluation it becomes the root of a [`Scope`] chain; every `{{#each}}`
//! iteration pushes a frame binding `this`, `@index`, `@first`, `@last`
//! and, for object elements, the element's own fields.
//!
//! JSON `null` is treated exactly like an absent key.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::{Map, Number, Value};

// ============================================================================
// Template Context
// ============================================================================

/// Values a template body can reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateContext {
    values: Map<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of any serializable value.
    ///
    /// Values that cannot be represented as JSON are stored as `null`,
    /// which resolves as absent.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.values.insert(key.into(), value);
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Present, non-null value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

impl From<Map<String, Value>> for TemplateContext {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl TryFrom<Value> for TemplateContext {
    type Error = Value;

    /// Only JSON objects convert; anything else is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(other),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for TemplateContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, Value)> for TemplateContext {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.values.insert(k.into(), v);
        }
    }
}

// ============================================================================
// Value helpers
// ============================================================================

/// Human-readable kind of a value, used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Truthiness of a resolved value.
///
/// Falsy: absent, `null`, `false`, `0`, `""`, and the literal strings
/// `"false"` and `"0"`. Arrays and objects are truthy even when empty.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !(s.is_empty() || s == "false" || s == "0"),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Text of a scalar value, `None` for arrays, objects and null.
pub fn stringify_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(format_number(n)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Formats numbers the way learners expect: `30`, `3.14`, never `30.0`.
fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

// ============================================================================
// Scope chain
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Frame<'s> {
    Values(&'s Map<String, Value>),
    Iteration {
        item: &'s Value,
        index: usize,
        len: usize,
    },
}

impl<'s> Frame<'s> {
    fn get(&self, key: &str) -> Option<Cow<'s, Value>> {
        match *self {
            Frame::Values(map) => map.get(key).map(Cow::Borrowed),
            Frame::Iteration { item, index, len } => match key {
                "this" => Some(Cow::Borrowed(item)),
                "@index" => Some(Cow::Owned(Value::from(index))),
                "@first" => Some(Cow::Owned(Value::Bool(index == 0))),
                "@last" => Some(Cow::Owned(Value::Bool(index + 1 == len))),
                _ => item.as_object()?.get(key).map(Cow::Borrowed),
            },
        }
    }
}

/// Lexical scope used while evaluating a template.
///
/// Lookups walk from the innermost frame outwards, so loop bindings and
/// element fields shadow outer values.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'s> {
    frame: Frame<'s>,
    parent: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    pub fn root(values: &'s Map<String, Value>) -> Self {
        Self {
            frame: Frame::Values(values),
            parent: None,
        }
    }

    /// A frame of values layered over `parent`.
    pub fn layered(values: &'s Map<String, Value>, parent: &'s Scope<'s>) -> Self {
        Self {
            frame: Frame::Values(values),
            parent: Some(parent),
        }
    }

    /// Iteration frame for element `index` of a `len`-element array.
    pub fn iteration(item: &'s Value, index: usize, len: usize, parent: &'s Scope<'s>) -> Self {
        Self {
            frame: Frame::Iteration { item, index, len },
            parent: Some(parent),
        }
    }

    fn lookup(&self, key: &str) -> Option<Cow<'s, Value>> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(value) = scope.frame.get(key) {
                return Some(value);
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve `name` or `a.b.c`.
    ///
    /// The exact dotted string is tried as a single key first, then the
    /// path is walked through nested objects (numeric segments index arrays).
    pub fn resolve(&self, path: &str) -> Option<Cow<'s, Value>> {
        if let Some(value) = self.lookup(path) {
            return non_null(value);
        }

        let (head, tail) = path.split_once('.')?;
        let resolved = match self.lookup(head)? {
            Cow::Borrowed(root) => walk(root, tail).map(Cow::Borrowed),
            Cow::Owned(root) => walk(&root, tail).cloned().map(Cow::Owned),
        };
        resolved.and_then(non_null)
    }
}

fn non_null(value: Cow<'_, Value>) -> Option<Cow<'_, Value>> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

fn walk<'v>(root: &'v Value, tail: &str) -> Option<&'v Value> {
    tail.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
