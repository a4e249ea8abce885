//! Per-job control state: pause gate, cancellation and progress counters.
//!
//! A fresh [`JobContext`] is created for every generation run, so pausing or
//! cancelling one job never leaks into the next.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::options::GenerationProgress;

/// Default number of completions between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Receives progress snapshots while a job runs.
///
/// Called from worker threads; implementations should return quickly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: GenerationProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(GenerationProgress) + Send + Sync,
{
    fn report(&self, progress: GenerationProgress) {
        self(progress)
    }
}

/// Open/closed gate checked before each tile starts.
#[derive(Debug)]
pub struct PauseGate {
    open: watch::Sender<bool>,
}

impl PauseGate {
    /// A gate that starts open.
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self { open }
    }

    pub fn pause(&self) {
        self.open.send_replace(false);
    }

    pub fn resume(&self) {
        self.open.send_replace(true);
    }

    pub fn is_paused(&self) -> bool {
        !*self.open.borrow()
    }

    /// Resolves once the gate is open.
    pub async fn wait_open(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Control handles shared between the dispatcher and the service.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct JobContext {
    gate: Arc<PauseGate>,
    cancellation: CancellationToken,
}

impl JobContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self {
            gate: Arc::new(PauseGate::new()),
            cancellation,
        }
    }

    pub fn pause(&self) {
        self.gate.pause();
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Wait until the next tile may start.
    ///
    /// Returns false once the job is cancelled, even while paused.
    pub async fn wait_until_runnable(&self) -> bool {
        if self.cancellation.is_cancelled() {
            return false;
        }
        if !self.gate.is_paused() {
            return true;
        }

        debug!("Generation paused, waiting for resume");
        tokio::select! {
            biased;

            _ = self.cancellation.cancelled() => false,
            _ = self.gate.wait_open() => !self.cancellation.is_cancelled(),
        }
    }
}

/// Completed/failed counters with throttled reporting.
pub struct ProgressTracker {
    total: u64,
    interval: u64,
    completed: AtomicU64,
    failed: AtomicU64,
    started: Instant,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressTracker {
    pub fn new(total: u64, interval: u64, sink: Option<Arc<dyn ProgressSink>>) -> Self {
        Self {
            total,
            interval: interval.max(1),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            started: Instant::now(),
            sink,
        }
    }

    /// Count a processed tile, reporting every `interval` completions and at the last tile.
    pub fn record_success(&self) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if completed % self.interval == 0 || completed == self.total {
            self.report();
        }
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Unconditional report at job end.
    pub fn report_final(&self) {
        self.report();
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn snapshot(&self) -> GenerationProgress {
        GenerationProgress::new(
            self.completed(),
            self.total,
            self.failed(),
            self.started.elapsed(),
        )
    }

    fn report(&self) {
        if let Some(sink) = &self.sink {
            sink.report(self.snapshot());
        }
    }
}
