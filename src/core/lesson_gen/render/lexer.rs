//! Tokenizer for the lesson template language.
//!
//! Splits a template body into literal text and `{{ … }}` tags:
//!
//! - `{{path}}`: variable substitution (`name`, `a.b.c`, `this`, `@index`)
//! - `{{#if path}}`, `{{#unless path}}`, `{{#each path}}`: block openers
//! - `{{else}}`: alternate branch of a conditional
//! - `{{/if}}`, `{{/unless}}`, `{{/each}}`: block closers
//!
//! `\{{` produces a literal `{{`. Whitespace inside the braces is ignored.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::lesson_gen::errors::TemplateRenderingError;

static PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@?[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)*$").expect("Failed to compile template path regex")
});

/// Block helpers understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    Unless,
    Each,
}

impl BlockKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(Self::If),
            "unless" => Some(Self::Unless),
            "each" => Some(Self::Each),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Unless => "unless",
            Self::Each => "each",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text(String),
    Variable(String),
    Open { kind: BlockKind, path: String },
    Else,
    Close(BlockKind),
}

/// A token and the 1-based line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Whether `expr` is a resolvable path expression.
pub fn is_path(expr: &str) -> bool {
    PATH_PATTERN.is_match(expr)
}

/// Tokenize a template body.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateRenderingError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut text_line = 1;
    let mut line = 1;
    let mut rest = source;

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("\\{{") {
            if text.is_empty() {
                text_line = line;
            }
            text.push_str("{{");
            rest = after;
            continue;
        }

        if let Some(after) = rest.strip_prefix("{{") {
            let end = after
                .find("}}")
                .ok_or_else(|| TemplateRenderingError::malformed("unterminated '{{' tag", line))?;
            let inner = &after[..end];

            if !text.is_empty() {
                tokens.push(Token {
                    kind: TokenKind::Text(std::mem::take(&mut text)),
                    line: text_line,
                });
            }
            tokens.push(Token {
                kind: classify(inner.trim(), line)?,
                line,
            });

            line += inner.matches('\n').count();
            rest = &after[end + 2..];
            continue;
        }

        if text.is_empty() {
            text_line = line;
        }
        if ch == '\n' {
            line += 1;
        }
        text.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    if !text.is_empty() {
        tokens.push(Token {
            kind: TokenKind::Text(text),
            line: text_line,
        });
    }

    Ok(tokens)
}

fn classify(tag: &str, line: usize) -> Result<TokenKind, TemplateRenderingError> {
    if tag == "else" {
        return Ok(TokenKind::Else);
    }

    if let Some(opener) = tag.strip_prefix('#') {
        let mut parts = opener.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        let kind = BlockKind::from_keyword(keyword).ok_or_else(|| {
            TemplateRenderingError::malformed(format!("unknown block helper '#{keyword}'"), line)
        })?;
        return match (parts.next(), parts.next()) {
            (Some(path), None) if is_path(path) => Ok(TokenKind::Open {
                kind,
                path: path.to_string(),
            }),
            _ => Err(TemplateRenderingError::malformed(
                format!("#{keyword} expects exactly one path argument"),
                line,
            )),
        };
    }

    if let Some(closer) = tag.strip_prefix('/') {
        let keyword = closer.trim();
        return BlockKind::from_keyword(keyword)
            .map(TokenKind::Close)
            .ok_or_else(|| {
                TemplateRenderingError::malformed(format!("unknown block closer '/{keyword}'"), line)
            });
    }

    if is_path(tag) {
        Ok(TokenKind::Variable(tag.to_string()))
    } else {
        Err(TemplateRenderingError::malformed(
            format!("invalid expression '{tag}'"),
            line,
        ))
    }
}
