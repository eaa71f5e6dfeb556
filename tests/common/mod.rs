//! Shared fixtures for the end-to-end pipeline tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use masquerade::config::ProjectConfig;
use masquerade::engine::{
    EngineClient, EngineError, LexicalEngine, RefactorEngine, RenameRequest, SourceChange,
};
use masquerade::progress::{CancelToken, NoProgress, Phase, ProgressSink, ProgressState};
use masquerade::refactor::{Anonymizer, RunOptions};
use masquerade::source::DartParser;
use masquerade::walk::FileFilter;
use tempfile::TempDir;

pub const SEED: &str = "flavor-prod";

/// A throwaway project root with a `lib/` directory.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn options(&self, seed: Option<&str>) -> RunOptions {
        let mut config = ProjectConfig::defaults(self.root());
        config.seed = seed.map(str::to_string);
        RunOptions::from_config(&config).unwrap()
    }

    pub fn lexical_engine(&self) -> LexicalEngine {
        LexicalEngine::new(self.root(), FileFilter::new("dart"))
    }
}

pub fn anonymizer<E>(engine: E, progress: Arc<dyn ProgressSink>, cancel: CancelToken) -> Anonymizer
where
    E: RefactorEngine + 'static,
{
    let client = EngineClient::spawn(engine, Duration::from_secs(10)).unwrap();
    Anonymizer::new(Arc::new(DartParser), client, progress, cancel)
}

pub fn quiet_anonymizer<E>(engine: E) -> Anonymizer
where
    E: RefactorEngine + 'static,
{
    anonymizer(engine, Arc::new(NoProgress), CancelToken::new())
}

/// Delegates to the lexical engine but fails every request aimed at one file.
pub struct FailingOn {
    pub inner: LexicalEngine,
    pub file_suffix: &'static str,
}

impl RefactorEngine for FailingOn {
    fn refactor(&mut self, request: &RenameRequest) -> Result<SourceChange, EngineError> {
        if request.file.ends_with(self.file_suffix) {
            return Err(EngineError::new("symbol is referenced from generated code"));
        }
        self.inner.refactor(request)
    }
}

/// Delegates to the lexical engine until request number `fail_at` (1-based), which fails.
pub struct FailingAtRequest {
    pub inner: LexicalEngine,
    pub fail_at: usize,
    pub seen: usize,
}

impl RefactorEngine for FailingAtRequest {
    fn refactor(&mut self, request: &RenameRequest) -> Result<SourceChange, EngineError> {
        self.seen += 1;
        if self.seen == self.fail_at {
            return Err(EngineError::new("rename would change a public API"));
        }
        self.inner.refactor(request)
    }
}

/// Never answers in time.
pub struct Unresponsive;

impl RefactorEngine for Unresponsive {
    fn refactor(&mut self, _request: &RenameRequest) -> Result<SourceChange, EngineError> {
        thread::sleep(Duration::from_secs(2));
        Ok(SourceChange::default())
    }
}

/// Cancels the run once the rename phase has finished `after` files.
pub struct CancelAfter {
    pub token: CancelToken,
    pub after: usize,
}

impl ProgressSink for CancelAfter {
    fn update(&self, state: &ProgressState) {
        if state.phase == Phase::Renaming && state.processed >= self.after {
            self.token.cancel();
        }
    }
}
