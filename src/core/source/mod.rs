//! Source access: the declaration-node capability.
//!
//! The rest of the crate only needs `{name, location, markers}` for each
//! annotated declaration. [`DeclarationParser`] is that seam; [`DartParser`]
//! is the shipped implementation.

mod dart;
pub mod lexer;

pub use dart::{is_valid_identifier, DartParser, RESERVED_WORDS};
pub use lexer::Span;

use std::fmt;

/// An annotation such as `@De` or `@JsonKey(name: 'x')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Qualified name without the `@`, e.g. `De` or `meta.De`.
    pub name: String,
    /// From the `@` through the closing `)` of any arguments.
    pub span: Span,
}

/// An annotated variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// Span of the declared name.
    pub span: Span,
    pub annotations: Vec<Annotation>,
}

impl Declaration {
    /// First annotation named `marker`.
    pub fn marker(&self, marker: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == marker)
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.marker(marker).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = lexer::line_col(source, offset);
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

pub trait DeclarationParser: Send + Sync {
    /// Annotated variable declarations in source order.
    fn parse_declarations(&self, source: &str) -> Result<Vec<Declaration>, ParseError>;
}

/// Declarations in `source` carrying `marker`.
pub fn marked_declarations(
    parser: &dyn DeclarationParser,
    source: &str,
    marker: &str,
) -> Result<Vec<Declaration>, ParseError> {
    Ok(parser
        .parse_declarations(source)?
        .into_iter()
        .filter(|d| d.has_marker(marker))
        .collect())
}
