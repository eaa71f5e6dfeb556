//! Serial rename phase.
//!
//! Files are processed one at a time and declarations one at a time within a
//! file. Each declaration is located again in the file's current contents
//! before its request, since earlier renames shift offsets. A file's renames
//! are journalled; if any of them fails, every file touched while processing
//! that file is restored and the run stops.

use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::RunOptions;
use crate::engine::{EngineClient, ExchangeError, RenameRequest, TextEdit};
use crate::error::{Error, Result};
use crate::naming::NameMapping;
use crate::progress::{CancelToken, Phase, ProgressSink, ProgressState};
use crate::source::{marked_declarations, Declaration, DeclarationParser, Span};
use crate::transaction::{rollback, Transaction};
use crate::utils::io::{self, display_relative};
use crate::walk::collect_files;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub files_total: usize,
    pub files_processed: usize,
    /// Declarations renamed.
    pub renamed: usize,
    /// Text edits applied, marker removals included.
    pub edits: usize,
    /// Files whose content changed, relative to the root.
    pub changed_files: BTreeSet<String>,
    pub cancelled: bool,
}

/// A marked declaration still waiting in the current file.
enum Pending {
    /// Name is a mapping key: ask the engine.
    Rename { decl: Declaration, marker: Span },
    /// Already carries its new name (renamed through another declaration): drop the marker only.
    StripMarker { marker: Span },
}

pub(super) fn rename_all(
    options: &RunOptions,
    mapping: &NameMapping,
    parser: &dyn DeclarationParser,
    engine: &mut EngineClient,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<RenameReport> {
    let files = collect_files(&options.root, &options.filter);
    let renamed_to: BTreeSet<&str> = mapping.iter().map(|(_, new)| new).collect();
    let mut report = RenameReport {
        files_total: files.len(),
        ..RenameReport::default()
    };
    let mut state = ProgressState::new(Phase::Renaming, files.len());
    progress.update(&state);

    for path in &files {
        if cancel.is_cancelled() {
            report.cancelled = true;
            state.cancelled = true;
            progress.update(&state);
            log_status!(
                "rename",
                "Cancelled after {} of {} files",
                report.files_processed,
                report.files_total
            );
            break;
        }

        let file = display_relative(&options.root, path);
        let mut journal: BTreeMap<PathBuf, String> = BTreeMap::new();
        let outcome = rename_in_file(
            path,
            &file,
            options,
            mapping,
            &renamed_to,
            parser,
            engine,
            &mut journal,
            &mut report,
        );

        if let Err(err) = outcome {
            // Restored files keep whatever earlier files committed into them.
            let unrestored = rollback(&journal);
            let mut err = err.with_detail("committedFiles", json!(report.changed_files));
            if !unrestored.is_empty() {
                let names: Vec<String> = unrestored
                    .iter()
                    .map(|p| display_relative(&options.root, p))
                    .collect();
                err = err.with_detail("unrestoredFiles", json!(names));
            }
            return Err(err);
        }

        for touched in journal.keys() {
            report
                .changed_files
                .insert(display_relative(&options.root, touched));
        }
        report.files_processed += 1;
        state.processed = report.files_processed;
        state.current_file = Some(file);
        progress.update(&state);
    }

    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn rename_in_file(
    path: &Path,
    file: &str,
    options: &RunOptions,
    mapping: &NameMapping,
    renamed_to: &BTreeSet<&str>,
    parser: &dyn DeclarationParser,
    engine: &mut EngineClient,
    journal: &mut BTreeMap<PathBuf, String>,
    report: &mut RenameReport,
) -> Result<()> {
    let initial = pending_count(path, file, options, mapping, renamed_to, parser)?;

    // Every step removes one marker, so the loop is bounded by the initial count.
    for _ in 0..initial {
        let source = io::read_file(path, &format!("read {}", file))?;
        let Some(next) = next_pending(&source, &options.marker, mapping, renamed_to, parser)
        else {
            break;
        };

        let mut tx = Transaction::new();
        match next {
            Pending::Rename { decl, marker } => {
                let new_name = mapping.get(&decl.name).unwrap_or_default();
                let request = RenameRequest::rename(path, decl.span.end, new_name);
                let change = engine
                    .request(&request)
                    .map_err(|e| exchange_error(e, file, &decl.name, new_name))?;
                tx.stage_change(&change);
                tx.stage(path, marker_removal(&source, marker));
                report.renamed += 1;
                log_status!("rename", "{}: {} -> {}", file, decl.name, new_name);
            }
            Pending::StripMarker { marker } => {
                tx.stage(path, marker_removal(&source, marker));
            }
        }

        let committed = tx.commit()?;
        report.edits += committed.edits;
        for (touched, original) in committed.originals {
            journal.entry(touched).or_insert(original);
        }
    }

    Ok(())
}

fn pending_count(
    path: &Path,
    file: &str,
    options: &RunOptions,
    mapping: &NameMapping,
    renamed_to: &BTreeSet<&str>,
    parser: &dyn DeclarationParser,
) -> Result<usize> {
    let source = io::read_file(path, &format!("read {}", file))?;
    match marked_declarations(parser, &source, &options.marker) {
        Ok(decls) => Ok(decls
            .iter()
            .filter(|d| mapping.contains(&d.name) || renamed_to.contains(d.name.as_str()))
            .count()),
        Err(err) => {
            log_status!("rename", "Skipping {}: {}", file, err);
            Ok(0)
        }
    }
}

fn next_pending(
    source: &str,
    marker: &str,
    mapping: &NameMapping,
    renamed_to: &BTreeSet<&str>,
    parser: &dyn DeclarationParser,
) -> Option<Pending> {
    let decls = marked_declarations(parser, source, marker).ok()?;
    decls.into_iter().find_map(|decl| {
        let marker_span = decl.marker(marker)?.span;
        if mapping.contains(&decl.name) {
            Some(Pending::Rename {
                decl,
                marker: marker_span,
            })
        } else if renamed_to.contains(decl.name.as_str()) {
            Some(Pending::StripMarker {
                marker: marker_span,
            })
        } else {
            None
        }
    })
}

fn exchange_error(err: ExchangeError, file: &str, declaration: &str, new_name: &str) -> Error {
    match err {
        ExchangeError::Engine(e) => Error::engine_failed(file, declaration, new_name, e.message),
        ExchangeError::Timeout(timeout) => {
            Error::engine_timeout(file, declaration, timeout.as_secs())
                .with_detail("timeoutMillis", json!(timeout.as_millis() as u64))
        }
        ExchangeError::Disconnected => Error::engine_failed(
            file,
            declaration,
            new_name,
            "Refactor engine is no longer available",
        ),
    }
}

/// Edit deleting the marker annotation and the blanks after it.
///
/// When nothing but whitespace remains on the line, the whole line goes.
pub fn marker_removal(source: &str, marker: Span) -> TextEdit {
    let bytes = source.as_bytes();
    let mut end = marker.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }

    let line_start = source[..marker.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[end..].find('\n').map_or(source.len(), |i| end + i);
    let before_blank = source[line_start..marker.start].trim().is_empty();
    let after_blank = source[end..line_end].trim().is_empty();

    if before_blank && after_blank {
        let remove_to = if line_end < source.len() {
            line_end + 1
        } else {
            line_end
        };
        return TextEdit::deletion(line_start, remove_to - line_start);
    }

    TextEdit::deletion(marker.start, end - marker.start)
}
