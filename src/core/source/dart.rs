use regex::Regex;
use std::sync::OnceLock;

use super::lexer::{tokenize, Span, Token, TokenKind};
use super::{Annotation, Declaration, DeclarationParser, ParseError};

/// Words that can never name a variable.
pub const RESERVED_WORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else",
    "enum", "extends", "false", "final", "finally", "for", "if", "in", "is", "new", "null",
    "rethrow", "return", "super", "switch", "this", "throw", "true", "try", "var", "void",
    "while", "with",
];

/// Contextual keywords that cannot start a type or be read as a declared name here.
const BUILT_IN_WORDS: &[&str] = &[
    "abstract", "as", "async", "await", "covariant", "deferred", "export", "extension",
    "external", "factory", "get", "hide", "implements", "import", "interface", "late",
    "library", "mixin", "operator", "part", "required", "set", "show", "static", "sync",
    "typedef", "yield",
];

const MODIFIERS: &[&str] = &["static", "late", "external", "covariant", "abstract"];
const BINDING_KEYWORDS: &[&str] = &["final", "const", "var"];

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").ok())
        .as_ref()
}

/// Whether `name` may be used as a Dart variable name.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_pattern().is_some_and(|re| re.is_match(name)) && !RESERVED_WORDS.contains(&name)
}

/// Finds annotated top-level, field and local variable declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DartParser;

impl DeclarationParser for DartParser {
    fn parse_declarations(&self, source: &str) -> Result<Vec<Declaration>, ParseError> {
        let tokens =
            tokenize(source).map_err(|e| ParseError::at(source, e.offset, e.message))?;
        Ok(Recognizer {
            src: source,
            tokens: &tokens,
        }
        .declarations())
    }
}

struct Recognizer<'a> {
    src: &'a str,
    tokens: &'a [Token],
}

impl Recognizer<'_> {
    fn declarations(&self) -> Vec<Declaration> {
        let mut found = Vec::new();
        let mut i = 0;

        while i < self.tokens.len() {
            if !self.punct_at(i, '@') {
                i += 1;
                continue;
            }

            let mut annotations = Vec::new();
            let mut next = i;
            while let Some((annotation, after)) = self.annotation(next) {
                annotations.push(annotation);
                next = after;
            }

            if let Some(name_idx) = self.variable(next) {
                let token = self.tokens[name_idx];
                found.push(Declaration {
                    name: token.text(self.src).to_string(),
                    span: token.span,
                    annotations,
                });
                next = name_idx + 1;
            }

            i = next.max(i + 1);
        }

        found
    }

    fn ident(&self, i: usize) -> Option<&str> {
        self.tokens
            .get(i)
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text(self.src))
    }

    fn punct_at(&self, i: usize, c: char) -> bool {
        self.tokens.get(i).is_some_and(|t| t.is_punct(self.src, c))
    }

    /// Two punctuation tokens with no gap, e.g. the `==` in `a == b`.
    fn glued(&self, i: usize, c: char) -> bool {
        match (self.tokens.get(i), self.tokens.get(i + 1)) {
            (Some(a), Some(b)) => b.is_punct(self.src, c) && a.span.end == b.span.start,
            _ => false,
        }
    }

    fn is_name(&self, i: usize) -> bool {
        self.ident(i).is_some_and(|word| {
            !RESERVED_WORDS.contains(&word) && !BUILT_IN_WORDS.contains(&word)
        })
    }

    fn ends_declarator(&self, i: usize) -> bool {
        if self.punct_at(i, ';') || self.punct_at(i, ',') {
            return true;
        }
        self.punct_at(i, '=') && !self.glued(i, '=') && !self.glued(i, '>')
    }

    /// `@Name`, `@prefix.Name` or `@Name(args)` starting at `i`.
    fn annotation(&self, i: usize) -> Option<(Annotation, usize)> {
        if !self.punct_at(i, '@') {
            return None;
        }
        let mut parts = vec![self.ident(i + 1)?];
        let mut k = i + 2;
        while self.punct_at(k, '.') {
            let Some(part) = self.ident(k + 1) else { break };
            parts.push(part);
            k += 2;
        }

        if self.punct_at(k, '(') {
            let mut depth = 0usize;
            while k < self.tokens.len() {
                if self.punct_at(k, '(') {
                    depth += 1;
                } else if self.punct_at(k, ')') {
                    depth -= 1;
                    if depth == 0 {
                        k += 1;
                        break;
                    }
                }
                k += 1;
            }
        }

        let span = Span::new(self.tokens[i].span.start, self.tokens[k - 1].span.end);
        Some((
            Annotation {
                name: parts.join("."),
                span,
            },
            k,
        ))
    }

    /// Index of the declared name if a variable declaration starts at `i`.
    fn variable(&self, i: usize) -> Option<usize> {
        let mut k = i;
        let mut bound = false;
        while let Some(word) = self.ident(k) {
            if MODIFIERS.contains(&word) {
                k += 1;
            } else if BINDING_KEYWORDS.contains(&word) {
                bound = true;
                k += 1;
            } else {
                break;
            }
        }

        if bound && self.is_name(k) && self.ends_declarator(k + 1) {
            return Some(k);
        }

        let name = self.skip_type(k)?;
        (self.is_name(name) && self.ends_declarator(name + 1)).then_some(name)
    }

    /// Skips `Type`, `prefix.Type`, `Type<...>` and a trailing `?`.
    fn skip_type(&self, i: usize) -> Option<usize> {
        if !self.is_name(i) {
            return None;
        }
        let mut k = i + 1;
        while self.punct_at(k, '.') && self.is_name(k + 1) {
            k += 2;
        }

        if self.punct_at(k, '<') {
            let mut depth = 0usize;
            loop {
                let token = self.tokens.get(k)?;
                if token.is_punct(self.src, '<') {
                    depth += 1;
                } else if token.is_punct(self.src, '>') {
                    depth -= 1;
                    if depth == 0 {
                        k += 1;
                        break;
                    }
                } else if token.is_punct(self.src, ';') || token.is_punct(self.src, '{') {
                    return None;
                }
                k += 1;
            }
        }

        if self.punct_at(k, '?') {
            k += 1;
        }
        Some(k)
    }
}
