//! In-flight progress tracking.
//!
//! The runner publishes coarse checkpoints to a shared board; the progress
//! view is derived from the persisted record plus the board's latest
//! checkpoint. When the record says `processing` but the board has no entry
//! (server restart, or the job runs on another process), the view falls back
//! to a fixed mid-run estimate rather than erroring.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use mentora_core::models::report::{ProgressView, Report, ReportStatus};

/// Shown while `processing` with no live checkpoint available.
const FALLBACK_PERCENT: u8 = 45;
const FALLBACK_ETA_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub percent: u8,
    pub message: String,
}

/// Latest checkpoint per in-flight report, shared between the worker pool
/// and the gateway.
#[derive(Clone, Default)]
pub struct ProgressBoard {
    inner: Arc<Mutex<HashMap<Uuid, Checkpoint>>>,
}

impl ProgressBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a checkpoint. Progress within a run is monotonic: an update
    /// below the recorded percentage is dropped.
    pub fn update(&self, id: Uuid, percent: u8, message: &str) {
        let mut board = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match board.get(&id) {
            Some(current) if current.percent > percent => {}
            _ => {
                board.insert(
                    id,
                    Checkpoint {
                        percent,
                        message: message.to_string(),
                    },
                );
            }
        }
    }

    pub fn latest(&self, id: Uuid) -> Option<Checkpoint> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Drop the entry once the record carries the terminal state.
    pub fn clear(&self, id: Uuid) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// Derive the client-facing progress view for a record.
pub fn progress_view(report: &Report, board: &ProgressBoard) -> ProgressView {
    let (progress, message, eta) = match report.status {
        ReportStatus::Pending => (0, "queued".to_string(), None),
        ReportStatus::Processing => match board.latest(report.id) {
            Some(checkpoint) => (checkpoint.percent, checkpoint.message, None),
            None => (
                FALLBACK_PERCENT,
                "collecting data".to_string(),
                Some(FALLBACK_ETA_SECONDS),
            ),
        },
        ReportStatus::Completed => (100, "completed".to_string(), None),
        ReportStatus::Failed => (
            0,
            report
                .error_message
                .clone()
                .unwrap_or_else(|| "report generation failed".to_string()),
            None,
        ),
    };

    ProgressView {
        report_id: report.id,
        status: report.status,
        progress,
        message,
        estimated_seconds_remaining: eta,
    }
}
