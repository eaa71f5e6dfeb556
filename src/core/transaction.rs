//! All-or-nothing application of text edits across files.
//!
//! Edits are staged against the files' current contents. `commit` validates
//! every file before writing any, then swaps the new contents in through temp
//! files. If a swap fails, files already replaced are restored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{SourceChange, TextEdit};
use crate::error::{Error, Result};
use crate::utils::io;

#[derive(Debug, Default)]
pub struct Transaction {
    staged: BTreeMap<PathBuf, Vec<TextEdit>>,
}

/// What a successful commit replaced.
#[derive(Debug, Default)]
pub struct Committed {
    /// Previous content of every rewritten file.
    pub originals: BTreeMap<PathBuf, String>,
    pub edits: usize,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage every edit of `change` except its potential edits.
    pub fn stage_change(&mut self, change: &SourceChange) {
        for (file, edits) in change.applicable() {
            for edit in edits {
                self.stage(file, edit.clone());
            }
        }
    }

    pub fn stage(&mut self, file: &Path, edit: TextEdit) {
        self.staged.entry(file.to_path_buf()).or_default().push(edit);
    }

    pub fn commit(self) -> Result<Committed> {
        let mut rewritten: Vec<(PathBuf, String, String)> = Vec::new();
        let mut edits_total = 0;

        for (path, mut edits) in self.staged {
            if edits.is_empty() {
                continue;
            }
            let original = io::read_file(&path, &format!("read {}", path.display()))
                .map_err(|e| Error::transaction_failed(path.display().to_string(), io_problem(&e)))?;
            edits.sort_by_key(|e| (e.offset, e.length));
            edits.dedup();
            let updated = apply_edits(&original, &edits)
                .map_err(|problem| Error::transaction_failed(path.display().to_string(), problem))?;
            edits_total += edits.len();
            rewritten.push((path, original, updated));
        }

        let mut replaced: Vec<&(PathBuf, String, String)> = Vec::new();
        for entry in &rewritten {
            let (path, _, updated) = entry;
            if let Err(err) = io::write_file_atomic(path, updated, &format!("write {}", path.display())) {
                restore(&replaced);
                return Err(Error::transaction_failed(
                    path.display().to_string(),
                    io_problem(&err),
                ));
            }
            replaced.push(entry);
        }

        Ok(Committed {
            originals: rewritten
                .into_iter()
                .map(|(path, original, _)| (path, original))
                .collect(),
            edits: edits_total,
        })
    }
}

fn io_problem(err: &Error) -> String {
    err.details["error"]
        .as_str()
        .unwrap_or(&err.message)
        .to_string()
}

fn restore(replaced: &[&(PathBuf, String, String)]) {
    for (path, original, _) in replaced {
        if let Err(err) = fs::write(path, original) {
            log_status!("rename", "Could not restore {}: {}", path.display(), err);
        }
    }
}

/// Apply sorted, non-overlapping edits to `source`.
pub fn apply_edits(source: &str, edits: &[TextEdit]) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;

    for edit in edits {
        if edit.offset < cursor {
            return Err(format!("Overlapping edits at offset {}", edit.offset));
        }
        if edit.end() > source.len() {
            return Err(format!(
                "Edit {}..{} is past the end of the file ({} bytes)",
                edit.offset,
                edit.end(),
                source.len()
            ));
        }
        if !source.is_char_boundary(edit.offset) || !source.is_char_boundary(edit.end()) {
            return Err(format!("Edit at offset {} splits a character", edit.offset));
        }
        out.push_str(&source[cursor..edit.offset]);
        out.push_str(&edit.replacement);
        cursor = edit.end();
    }

    out.push_str(&source[cursor..]);
    Ok(out)
}

/// Restore journalled originals. Returns the files that could not be restored.
pub fn rollback(originals: &BTreeMap<PathBuf, String>) -> Vec<PathBuf> {
    let mut failed = Vec::new();
    for (path, content) in originals {
        if io::write_file_atomic(path, content, &format!("restore {}", path.display())).is_err() {
            log_status!("rename", "Could not restore {}", path.display());
            failed.push(path.clone());
        }
    }
    failed
}
