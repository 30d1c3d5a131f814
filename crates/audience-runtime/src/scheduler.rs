//! Periodic batch runs.
//!
//! [`BatchScheduler`] runs a [`BatchPipeline`] on a tokio interval, each run
//! on a blocking thread, and streams [`BatchOutcome`] values through an
//! `mpsc` channel. The engine itself stays synchronous.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};

use crate::batch::{BatchPipeline, BatchReport};

// ── Public types ──────────────────────────────────────────────────────────────

/// Result of one scheduled run. `run` counts from 1.
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed { run: u64, report: Box<BatchReport> },
    Failed { run: u64, error: String },
}

impl BatchOutcome {
    pub fn run(&self) -> u64 {
        match self {
            BatchOutcome::Completed { run, .. } | BatchOutcome::Failed { run, .. } => *run,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Completed { .. })
    }
}

// ── BatchScheduler ────────────────────────────────────────────────────────────

pub struct BatchScheduler {
    interval: Duration,
    pipeline: BatchPipeline,
}

impl BatchScheduler {
    pub fn new(interval_secs: u64, pipeline: BatchPipeline) -> Self {
        Self {
            interval: Duration::from_secs(interval_secs),
            pipeline,
        }
    }

    /// Start the schedule in a tokio task.
    ///
    /// The first run starts immediately. Returns the outcome receiver and a
    /// [`SchedulerHandle`] that stops the schedule.
    pub fn start(self) -> (mpsc::Receiver<BatchOutcome>, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.schedule_loop(tx).await;
        });

        (rx, SchedulerHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Exits when the receiver is dropped.
    async fn schedule_loop(self, tx: mpsc::Sender<BatchOutcome>) {
        let mut interval = time::interval(self.interval);
        // A slow run delays the next one instead of triggering a burst.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut run = 0u64;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("batch outcome channel closed; exiting schedule");
                break;
            }

            run += 1;
            let outcome = self.run_once(run).await;
            match &outcome {
                BatchOutcome::Completed { report, .. } => tracing::info!(
                    run,
                    files = report.files.len(),
                    "scheduled batch run completed"
                ),
                BatchOutcome::Failed { error, .. } => {
                    tracing::warn!(run, error = %error, "scheduled batch run failed")
                }
            }

            if tx.send(outcome).await.is_err() {
                tracing::debug!("batch outcome receiver dropped; exiting schedule");
                break;
            }
        }
    }

    async fn run_once(&self, run: u64) -> BatchOutcome {
        let pipeline = self.pipeline.clone();
        match tokio::task::spawn_blocking(move || pipeline.run()).await {
            Ok(Ok(report)) => BatchOutcome::Completed {
                run,
                report: Box::new(report),
            },
            Ok(Err(e)) => BatchOutcome::Failed {
                run,
                error: e.to_string(),
            },
            Err(e) => BatchOutcome::Failed {
                run,
                error: format!("batch task did not complete: {}", e),
            },
        }
    }
}

// ── SchedulerHandle ───────────────────────────────────────────────────────────

/// Handle to the background schedule. Call [`SchedulerHandle::abort`] to stop.
pub struct SchedulerHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
