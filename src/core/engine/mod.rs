//! Refactor engine boundary.
//!
//! An engine answers one [`RenameRequest`] with a [`SourceChange`] describing
//! every edit needed across the project. It never writes files itself; the
//! caller applies the change through a transaction.
//!
//! - `client` - runs an engine on its own thread with a per-request timeout
//! - `lexical` - token-level engine over the project's source files

mod client;
mod lexical;

pub use client::{EngineClient, ExchangeError};
pub use lexical::LexicalEngine;

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefactorKind {
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    pub file: PathBuf,
    /// Byte offset inside or at the end of the declared name.
    pub offset: usize,
    pub new_name: String,
    pub kind: RefactorKind,
}

impl RenameRequest {
    pub fn rename(file: impl Into<PathBuf>, offset: usize, new_name: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            offset,
            new_name: new_name.into(),
            kind: RefactorKind::Rename,
        }
    }
}

/// Replace `length` bytes at `offset` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub offset: usize,
    pub length: usize,
    pub replacement: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl TextEdit {
    pub fn new(offset: usize, length: usize, replacement: impl Into<String>) -> Self {
        Self {
            offset,
            length,
            replacement: replacement.into(),
            id: None,
        }
    }

    pub fn deletion(offset: usize, length: usize) -> Self {
        Self::new(offset, length, "")
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub file: PathBuf,
    pub edits: Vec<TextEdit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceChange {
    pub message: String,
    pub files: Vec<FileChange>,
    /// Ids of edits the engine is unsure about. These are never applied.
    pub potential_edits: BTreeSet<String>,
}

impl SourceChange {
    pub fn is_potential(&self, edit: &TextEdit) -> bool {
        edit.id
            .as_ref()
            .is_some_and(|id| self.potential_edits.contains(id))
    }

    /// Edits that will be applied, grouped by file.
    pub fn applicable(&self) -> impl Iterator<Item = (&PathBuf, Vec<&TextEdit>)> {
        self.files.iter().map(|fc| {
            let edits = fc.edits.iter().filter(|e| !self.is_potential(e)).collect();
            (&fc.file, edits)
        })
    }

    pub fn edit_count(&self) -> usize {
        self.applicable().map(|(_, edits)| edits.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

/// Computes the edits for a refactoring. Called from a single thread at a time.
pub trait RefactorEngine: Send {
    fn refactor(&mut self, request: &RenameRequest) -> Result<SourceChange, EngineError>;
}

impl<E: RefactorEngine + ?Sized> RefactorEngine for Box<E> {
    fn refactor(&mut self, request: &RenameRequest) -> Result<SourceChange, EngineError> {
        (**self).refactor(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn potential_edits_are_not_applicable() {
        let mut change = SourceChange {
            message: "rename".to_string(),
            files: vec![FileChange {
                file: PathBuf::from("a.dart"),
                edits: vec![
                    TextEdit::new(0, 3, "xyz"),
                    TextEdit::new(10, 3, "xyz").with_id("doc-1"),
                    TextEdit::new(20, 3, "xyz").with_id("ref-2"),
                ],
            }],
            potential_edits: BTreeSet::new(),
        };
        change.potential_edits.insert("doc-1".to_string());

        assert_eq!(change.edit_count(), 2);
        let (_, edits) = change.applicable().next().unwrap();
        assert!(edits.iter().all(|e| e.offset != 10));
    }
}
