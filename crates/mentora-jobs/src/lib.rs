//! mentora-jobs
//!
//! Background execution for reports: the job runner state machine, the
//! worker pool over a framework-agnostic queue, the progress tracker, the
//! service facade the gateway calls, and the reconciliation sweeps.

pub mod error;
pub mod progress;
pub mod queue;
pub mod reaper;
pub mod runner;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use mentora_export::registry::Registry;
use mentora_store::reports::ReportStore;

use crate::progress::ProgressBoard;

/// Deadlines for a single job run. The soft deadline raises a cooperative
/// cancellation signal; the hard deadline aborts the run outright, leaving
/// the record `processing` for the stalled sweep to reconcile.
#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub soft_deadline: Duration,
    pub hard_deadline: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            soft_deadline: Duration::from_secs(300),
            hard_deadline: Duration::from_secs(600),
        }
    }
}

/// Everything a job run needs, explicitly constructed at startup and
/// injected into the runner — no import-time singletons.
pub struct JobContext<A> {
    pub store: Arc<ReportStore>,
    pub analytics: Arc<A>,
    pub registry: Arc<Registry>,
    pub progress: ProgressBoard,
    pub config: RunnerConfig,
}

impl<A> Clone for JobContext<A> {
    fn clone(&self) -> Self {
        JobContext {
            store: Arc::clone(&self.store),
            analytics: Arc::clone(&self.analytics),
            registry: Arc::clone(&self.registry),
            progress: self.progress.clone(),
            config: self.config,
        }
    }
}
