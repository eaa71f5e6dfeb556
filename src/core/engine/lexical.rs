use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::{EngineError, FileChange, RefactorEngine, RenameRequest, SourceChange, TextEdit};
use crate::source::is_valid_identifier;
use crate::source::lexer::{tokenize, Token, TokenKind};
use crate::utils::io::display_relative;
use crate::walk::{collect_files, FileFilter};

/// Renames by identifier token across every matching file under a root.
///
/// Every identifier token spelled like the target is renamed, including
/// string interpolations. `[name]` references inside doc comments are returned
/// as potential edits. Files that fail to tokenize are left alone; the file
/// named in the request must tokenize.
pub struct LexicalEngine {
    root: PathBuf,
    filter: FileFilter,
}

impl LexicalEngine {
    pub fn new(root: impl Into<PathBuf>, filter: FileFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    fn target_name(&self, request: &RenameRequest) -> Result<String, EngineError> {
        let file = display_relative(&self.root, &request.file);
        let source = read(&request.file)?;
        let tokens = tokenize(&source)
            .map_err(|e| EngineError::new(format!("Cannot tokenize {}: {}", file, e.message)))?;

        tokens
            .iter()
            .find(|t| t.kind == TokenKind::Identifier && t.span.touches(request.offset))
            .map(|t| t.text(&source).to_string())
            .ok_or_else(|| {
                EngineError::new(format!(
                    "No identifier at offset {} in {}",
                    request.offset, file
                ))
            })
    }
}

impl RefactorEngine for LexicalEngine {
    fn refactor(&mut self, request: &RenameRequest) -> Result<SourceChange, EngineError> {
        let new_name = request.new_name.as_str();
        if !is_valid_identifier(new_name) {
            return Err(EngineError::new(format!(
                "'{}' is not a valid identifier",
                new_name
            )));
        }

        let old_name = self.target_name(request)?;
        let mut change = SourceChange {
            message: format!("Rename '{}' to '{}'", old_name, new_name),
            ..SourceChange::default()
        };
        if old_name == new_name {
            return Ok(change);
        }

        let mut doc_refs = 0usize;
        for path in collect_files(&self.root, &self.filter) {
            let Ok(source) = read(&path) else {
                continue;
            };
            let Ok(tokens) = tokenize(&source) else {
                continue;
            };

            if tokens.iter().any(|t| is_ident(t, &source, new_name)) {
                return Err(EngineError::new(format!(
                    "'{}' is already used in {}",
                    new_name,
                    display_relative(&self.root, &path)
                )));
            }

            let mut edits: Vec<TextEdit> = tokens
                .iter()
                .filter(|t| is_ident(t, &source, &old_name))
                .map(|t| TextEdit::new(t.span.start, t.span.len(), new_name))
                .collect();

            for token in tokens.iter().filter(|t| t.kind == TokenKind::DocComment) {
                for offset in doc_references(token.text(&source), &old_name) {
                    doc_refs += 1;
                    let id = format!("doc-{}", doc_refs);
                    change.potential_edits.insert(id.clone());
                    edits.push(
                        TextEdit::new(token.span.start + offset, old_name.len(), new_name)
                            .with_id(id),
                    );
                }
            }

            if !edits.is_empty() {
                edits.sort_by_key(|e| e.offset);
                change.files.push(FileChange { file: path, edits });
            }
        }

        Ok(change)
    }
}

fn read(path: &Path) -> Result<String, EngineError> {
    std::fs::read_to_string(path)
        .map_err(|e| EngineError::new(format!("Cannot read {}: {}", path.display(), e)))
}

fn is_ident(token: &Token, source: &str, name: &str) -> bool {
    token.kind == TokenKind::Identifier && token.text(source) == name
}

/// Offsets of `name` inside `[name]` within a doc comment.
fn doc_references(comment: &str, name: &str) -> BTreeSet<usize> {
    let needle = format!("[{}]", name);
    comment
        .match_indices(&needle)
        .map(|(idx, _)| idx + 1)
        .collect()
}
