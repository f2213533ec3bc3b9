//! Recursive-descent parser building the block tree of a template.

use crate::core::lesson_gen::errors::TemplateRenderingError;

use super::lexer::{tokenize, BlockKind, Token, TokenKind};

/// A node of the parsed template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Variable {
        path: String,
        line: usize,
    },
    /// `#if` (`negated == false`) or `#unless` (`negated == true`).
    Conditional {
        negated: bool,
        path: String,
        line: usize,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Each {
        path: String,
        line: usize,
        body: Vec<Node>,
    },
}

/// A template body that parsed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    nodes: Vec<Node>,
}

impl ParsedTemplate {
    /// Tokenize and parse `source`, rejecting blocks nested deeper than `max_depth`.
    pub fn parse(source: &str, max_depth: usize) -> Result<Self, TemplateRenderingError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            tokens: tokens.into_iter(),
            max_depth,
        };
        let (nodes, _) = parser.sequence(0, None)?;
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// How a node sequence ended.
enum Terminator {
    EndOfInput,
    Else,
    Close,
}

struct Parser {
    tokens: std::vec::IntoIter<Token>,
    max_depth: usize,
}

impl Parser {
    /// Parse nodes until end of input, or until `{{else}}` / the closer of
    /// `open` (the enclosing block kind and the line it was opened on).
    fn sequence(
        &mut self,
        depth: usize,
        open: Option<(BlockKind, usize)>,
    ) -> Result<(Vec<Node>, Terminator), TemplateRenderingError> {
        let mut nodes = Vec::new();

        while let Some(Token { kind, line }) = self.tokens.next() {
            match kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::Variable(path) => nodes.push(Node::Variable { path, line }),
                TokenKind::Open { kind, path } => {
                    nodes.push(self.block(kind, path, line, depth + 1)?);
                }
                TokenKind::Else => {
                    return match open {
                        Some((BlockKind::Each, _)) => Err(TemplateRenderingError::malformed(
                            "{{else}} is not supported inside #each",
                            line,
                        )),
                        Some(_) => Ok((nodes, Terminator::Else)),
                        None => Err(TemplateRenderingError::malformed(
                            "{{else}} outside of a block",
                            line,
                        )),
                    };
                }
                TokenKind::Close(closed) => {
                    return match open {
                        Some((expected, _)) if expected == closed => Ok((nodes, Terminator::Close)),
                        Some((expected, _)) => Err(TemplateRenderingError::malformed(
                            format!("expected {{{{/{expected}}}}} but found {{{{/{closed}}}}}"),
                            line,
                        )),
                        None => Err(TemplateRenderingError::malformed(
                            format!("unexpected {{{{/{closed}}}}}"),
                            line,
                        )),
                    };
                }
            }
        }

        match open {
            Some((kind, opened_at)) => Err(TemplateRenderingError::UnclosedBlock {
                keyword: kind.keyword().to_string(),
                line: opened_at,
            }),
            None => Ok((nodes, Terminator::EndOfInput)),
        }
    }

    fn block(
        &mut self,
        kind: BlockKind,
        path: String,
        line: usize,
        depth: usize,
    ) -> Result<Node, TemplateRenderingError> {
        if depth > self.max_depth {
            return Err(TemplateRenderingError::NestingTooDeep {
                max_depth: self.max_depth,
                line,
            });
        }

        let open = Some((kind, line));
        let (body, terminator) = self.sequence(depth, open)?;

        if kind == BlockKind::Each {
            return Ok(Node::Each { path, line, body });
        }

        let otherwise = match terminator {
            Terminator::Else => {
                let (otherwise, terminator) = self.sequence(depth, open)?;
                if let Terminator::Else = terminator {
                    return Err(TemplateRenderingError::malformed(
                        format!("more than one {{{{else}}}} in #{kind} block"),
                        line,
                    ));
                }
                otherwise
            }
            Terminator::Close | Terminator::EndOfInput => Vec::new(),
        };

        Ok(Node::Conditional {
            negated: kind == BlockKind::Unless,
            path,
            line,
            then: body,
            otherwise,
        })
    }
}
