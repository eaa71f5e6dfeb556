//! Anonymization run: scan, generate, persist, rename.
//!
//! [`Anonymizer::run`] drives the state machine
//! `Idle -> Scanning -> Generating -> Renaming -> {Completed, Cancelled, Failed}`.
//! With a seed, the mapping file is rewritten once per run (possibly empty)
//! before the first source edit, and is never changed afterwards.

mod rename;

pub use rename::{marker_removal, RenameReport};

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::corpus::Corpus;
use crate::engine::EngineClient;
use crate::error::Result;
use crate::mapping;
use crate::naming::{self, GeneratorOptions, NameMapping};
use crate::progress::{CancelToken, ProgressSink};
use crate::scanner::{self, ScanOptions, ScanReport};
use crate::source::DeclarationParser;
use crate::walk::FileFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Scanning,
    Generating,
    Renaming,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Cancelled | RunState::Failed
        )
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub root: PathBuf,
    pub seed: Option<String>,
    pub marker: String,
    pub filter: FileFilter,
    pub corpus: Corpus,
    pub generator: GeneratorOptions,
    pub mapping_path: PathBuf,
    pub workers: Option<usize>,
    /// Stop after generating the mapping; nothing is written.
    pub dry_run: bool,
    /// Fail when any file could not be scanned instead of skipping it.
    pub strict: bool,
}

impl RunOptions {
    pub fn from_config(config: &ProjectConfig) -> Result<Self> {
        Ok(Self {
            root: config.root.clone(),
            seed: config.seed().map(str::to_string),
            marker: config.marker.clone(),
            filter: config.file_filter(),
            corpus: config.corpus()?,
            generator: config.generator_options(),
            mapping_path: config.mapping_path(),
            workers: None,
            dry_run: false,
            strict: false,
        })
    }

    fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            root: self.root.clone(),
            filter: self.filter.clone(),
            marker: self.marker.clone(),
            workers: self.workers,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub scan: ScanReport,
    /// Attempt that produced the mapping; 0 when none was generated.
    pub attempts: u32,
    pub mapping: NameMapping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameReport>,
    pub dry_run: bool,
}

impl RunReport {
    fn new(dry_run: bool) -> Self {
        Self {
            state: RunState::Idle,
            scan: ScanReport::default(),
            attempts: 0,
            mapping: NameMapping::default(),
            mapping_file: None,
            rename: None,
            dry_run,
        }
    }
}

pub struct Anonymizer {
    parser: Arc<dyn DeclarationParser>,
    engine: EngineClient,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
    state: RunState,
}

impl Anonymizer {
    pub fn new(
        parser: Arc<dyn DeclarationParser>,
        engine: EngineClient,
        progress: Arc<dyn ProgressSink>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            parser,
            engine,
            progress,
            cancel,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Token that cancels the run at the next file boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn run(&mut self, options: &RunOptions) -> Result<RunReport> {
        let result = self.run_phases(options);
        if result.is_err() {
            self.state = RunState::Failed;
        }
        result
    }

    fn run_phases(&mut self, options: &RunOptions) -> Result<RunReport> {
        let mut report = RunReport::new(options.dry_run);

        self.state = RunState::Scanning;
        report.scan = scanner::scan(
            &options.scan_options(),
            self.parser.as_ref(),
            &self.cancel,
            self.progress.as_ref(),
        )?;
        log_status!(
            "scan",
            "Found {} marked names in {} files",
            report.scan.names.len(),
            report.scan.files_scanned
        );
        if report.scan.cancelled {
            return Ok(self.finish(report, RunState::Cancelled));
        }
        if options.strict {
            if let Some(skipped) = report.scan.skipped.first() {
                return Err(skipped.to_error());
            }
        }

        self.state = RunState::Generating;
        let Some(seed) = options.seed.as_deref() else {
            log_status!("generate", "No channel name configured; nothing to rename");
            return Ok(self.finish(report, RunState::Completed));
        };
        let generation = naming::generate(
            &report.scan.names,
            seed,
            &options.corpus,
            &options.generator,
        )?;
        report.attempts = generation.attempts;
        report.mapping = generation.mapping;

        if options.dry_run {
            return Ok(self.finish(report, RunState::Completed));
        }

        // Every seeded run replaces the mapping file, even with nothing to rename.
        mapping::persist(&report.mapping, &options.mapping_path)?;
        report.mapping_file = Some(options.mapping_path.clone());
        if report.mapping.is_empty() {
            return Ok(self.finish(report, RunState::Completed));
        }

        self.state = RunState::Renaming;
        let renamed = rename::rename_all(
            options,
            &report.mapping,
            self.parser.as_ref(),
            &mut self.engine,
            &self.cancel,
            self.progress.as_ref(),
        )?;
        let terminal = if renamed.cancelled {
            RunState::Cancelled
        } else {
            RunState::Completed
        };
        report.rename = Some(renamed);

        Ok(self.finish(report, terminal))
    }

    fn finish(&mut self, mut report: RunReport, state: RunState) -> RunReport {
        self.state = state;
        report.state = state;
        report
    }
}
