//! Parallel discovery of marked declarations.
//!
//! Files are parsed read-only by a bounded pool of scoped worker threads that
//! pull indices from a shared cursor. Names land in one mutex-guarded set, so
//! the result does not depend on worker interleaving. The calling thread is the
//! only progress writer.

use serde::Serialize;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use crate::error::{Error, Result};
use crate::progress::{CancelToken, Phase, ProgressSink, ProgressState};
use crate::source::{marked_declarations, DeclarationParser};
use crate::utils::io::{self, display_relative};
use crate::walk::{collect_files, FileFilter};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: PathBuf,
    pub filter: FileFilter,
    pub marker: String,
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl ScanOptions {
    pub fn new(root: impl Into<PathBuf>, filter: FileFilter, marker: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            filter,
            marker: marker.into(),
            workers: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
    /// 1-based `(line, column)` of a parse failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<(usize, usize)>,
}

impl SkippedFile {
    /// The skip as a hard error, for callers that refuse partial scans.
    pub fn to_error(&self) -> Error {
        let (line, column) = self.position.unwrap_or((0, 0));
        Error::source_parse_failed(&self.file, line, column, &self.reason)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub names: BTreeSet<String>,
    pub files_total: usize,
    pub files_scanned: usize,
    /// Marked declarations found, counting repeats of the same name.
    pub declarations: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    pub cancelled: bool,
}

enum FileOutcome {
    Scanned { file: String, declarations: usize },
    Skipped(SkippedFile),
}

/// Walk `options.root` and collect the distinct marked names.
pub fn scan(
    options: &ScanOptions,
    parser: &dyn DeclarationParser,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<ScanReport> {
    let files = collect_files(&options.root, &options.filter);
    scan_files(options, &files, parser, cancel, progress)
}

/// Scan an explicit file list. Order of `files` does not affect the names found.
pub fn scan_files(
    options: &ScanOptions,
    files: &[PathBuf],
    parser: &dyn DeclarationParser,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
) -> Result<ScanReport> {
    let total = files.len();
    let mut state = ProgressState::new(Phase::Scanning, total);
    progress.update(&state);

    let names: Mutex<BTreeSet<String>> = Mutex::new(BTreeSet::new());
    let cursor = AtomicUsize::new(0);
    let workers = worker_count(options.workers, total);
    let mut report = ScanReport {
        files_total: total,
        ..ScanReport::default()
    };

    thread::scope(|scope| -> Result<()> {
        let (tx, rx) = mpsc::channel::<FileOutcome>();

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let tx = tx.clone();
                let names = &names;
                let cursor = &cursor;
                scope.spawn(move || loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(path) = files.get(index) else {
                        break;
                    };
                    let outcome = scan_one(&options.root, path, &options.marker, parser, names);
                    if tx.send(outcome).is_err() {
                        break;
                    }
                })
            })
            .collect();
        drop(tx);

        for outcome in rx {
            match outcome {
                FileOutcome::Scanned { file, declarations } => {
                    report.declarations += declarations;
                    state.current_file = Some(file);
                }
                FileOutcome::Skipped(skipped) => {
                    log_status!("scan", "Skipping {}: {}", skipped.file, skipped.reason);
                    state.current_file = Some(skipped.file.clone());
                    report.skipped.push(skipped);
                }
            }
            report.files_scanned += 1;
            state.processed = report.files_scanned;
            progress.update(&state);
        }

        for handle in handles {
            handle
                .join()
                .map_err(|_| Error::internal_unexpected("Scan worker thread panicked"))?;
        }
        Ok(())
    })?;

    report.names = names.into_inner().unwrap_or_else(PoisonError::into_inner);
    report.skipped.sort_by(|a, b| a.file.cmp(&b.file));
    report.cancelled = cancel.is_cancelled() && report.files_scanned < total;

    if report.cancelled {
        state.cancelled = true;
        progress.update(&state);
    }

    Ok(report)
}

fn scan_one(
    root: &Path,
    path: &Path,
    marker: &str,
    parser: &dyn DeclarationParser,
    names: &Mutex<BTreeSet<String>>,
) -> FileOutcome {
    let file = display_relative(root, path);

    let source = match io::read_file(path, &format!("read {}", file)) {
        Ok(source) => source,
        Err(err) => {
            let reason = err.details["error"]
                .as_str()
                .unwrap_or(&err.message)
                .to_string();
            return FileOutcome::Skipped(SkippedFile {
                file,
                reason,
                position: None,
            });
        }
    };

    match marked_declarations(parser, &source, marker) {
        Ok(found) => {
            let declarations = found.len();
            if declarations > 0 {
                let mut set = names.lock().unwrap_or_else(PoisonError::into_inner);
                set.extend(found.into_iter().map(|d| d.name));
            }
            FileOutcome::Scanned { file, declarations }
        }
        Err(err) => FileOutcome::Skipped(SkippedFile {
            file,
            reason: err.message,
            position: Some((err.line, err.column)),
        }),
    }
}

fn worker_count(requested: Option<usize>, files: usize) -> usize {
    let available = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    requested.unwrap_or(available).max(1).min(files.max(1))
}
