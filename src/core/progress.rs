//! Progress reporting and cooperative cancellation.
//!
//! Both phases publish a [`ProgressState`] through a [`ProgressSink`] after each
//! file. Exactly one thread writes progress per phase; sinks only observe.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Scanning,
    Renaming,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Scanning => "scan",
            Phase::Renaming => "rename",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    pub phase: Phase,
    pub processed: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    pub cancelled: bool,
}

impl ProgressState {
    pub fn new(phase: Phase, total: usize) -> Self {
        Self {
            phase,
            total,
            ..Self::default()
        }
    }

    /// Completed share in `0.0..=1.0`. An empty phase counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.processed as f64 / self.total as f64
    }
}

pub trait ProgressSink: Send + Sync {
    fn update(&self, state: &ProgressState);
}

/// Discards all updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _state: &ProgressState) {}
}

/// Keeps the latest state so a caller on another thread can poll it.
#[derive(Default)]
pub struct SharedProgress {
    latest: RwLock<ProgressState>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressState {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for SharedProgress {
    fn update(&self, state: &ProgressState) {
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
    }
}

/// Prints `[scan] lib/a.dart (3/10)` style lines via `log_status!`.
pub struct StatusLineProgress;

impl ProgressSink for StatusLineProgress {
    fn update(&self, state: &ProgressState) {
        let file = state.current_file.as_deref().unwrap_or("-");
        match state.phase {
            Phase::Scanning => {
                log_status!("scan", "{} ({}/{})", file, state.processed, state.total)
            }
            Phase::Renaming => {
                log_status!("rename", "{} ({}/{})", file, state.processed, state.total)
            }
        }
    }
}

/// Cooperative cancellation flag shared between the caller and a running phase.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_empty_phase_is_complete() {
        let state = ProgressState::new(Phase::Renaming, 0);
        assert_eq!(state.fraction(), 1.0);
    }

    #[test]
    fn fraction_tracks_processed_files() {
        let mut state = ProgressState::new(Phase::Scanning, 4);
        state.processed = 1;
        assert_eq!(state.fraction(), 0.25);
    }

    #[test]
    fn shared_progress_keeps_latest_update() {
        let sink = SharedProgress::new();
        let mut state = ProgressState::new(Phase::Renaming, 2);
        state.processed = 2;
        state.current_file = Some("lib/main.dart".to_string());
        sink.update(&state);
        assert_eq!(sink.snapshot(), state);
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
