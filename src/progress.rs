// src/progress.rs
//
// Observer interface injected into every pipeline layer, plus the two
// implementations the CLI uses: plain tracing output and an indicatif bar.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error};

use crate::error::FetchError;

/// Receives pipeline events. Implementations must tolerate calls from many
/// tasks at once and must not influence control flow.
pub trait ProgressObserver: Send + Sync {
    /// A replay was fetched, parsed and persisted.
    fn record_success(&self, id: &str);
    /// A replay or user listing failed and was dropped from the run.
    fn record_failure(&self, id: &str, cause: &FetchError);
    /// One unit of top-level work (a user) finished, successful or not.
    fn advance(&self);
    /// Number of top-level units the run will advance through.
    fn set_total(&self, _total: u64) {}
    fn finish(&self) {}
}

/// Point-in-time copy of [`ProgressCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub advanced: u64,
    pub finished: u64,
}

#[derive(Debug, Default)]
pub struct ProgressCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
    advanced: AtomicU64,
    finished: AtomicU64,
}

impl ProgressCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            advanced: self.advanced.load(Ordering::Relaxed),
            finished: self.finished.load(Ordering::Relaxed),
        }
    }
}

/// Logs every event through `tracing` and keeps running totals.
#[derive(Debug, Default)]
pub struct TracingObserver {
    counters: ProgressCounters,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }
}

impl ProgressObserver for TracingObserver {
    fn record_success(&self, id: &str) {
        self.counters.succeeded.fetch_add(1, Ordering::Relaxed);
        debug!("Saved replay {}", id);
    }

    fn record_failure(&self, id: &str, cause: &FetchError) {
        self.counters.failed.fetch_add(1, Ordering::Relaxed);
        error!("Failed to process {}: {}", id, cause);
    }

    fn advance(&self) {
        self.counters.advanced.fetch_add(1, Ordering::Relaxed);
    }

    fn finish(&self) {
        self.counters.finished.fetch_add(1, Ordering::Relaxed);
    }
}

/// Terminal progress bar advanced once per completed user.
pub struct ProgressBarObserver {
    inner: TracingObserver,
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(&format!(
                "{label}: {{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} users ({{msg}}, ETA: {{eta}})"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { inner: TracingObserver::new(), bar }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner.snapshot()
    }

    fn refresh_message(&self) {
        let s = self.inner.snapshot();
        self.bar.set_message(format!("{} replays, {} failed", s.succeeded, s.failed));
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn record_success(&self, id: &str) {
        self.inner.record_success(id);
        self.refresh_message();
    }

    fn record_failure(&self, id: &str, cause: &FetchError) {
        self.bar.suspend(|| self.inner.record_failure(id, cause));
        self.refresh_message();
    }

    fn advance(&self) {
        self.inner.advance();
        self.bar.inc(1);
    }

    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
    }

    fn finish(&self) {
        self.inner.finish();
        self.refresh_message();
        self.bar.finish();
    }
}
