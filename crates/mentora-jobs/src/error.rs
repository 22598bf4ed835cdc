//! mentora-jobs error types.

use thiserror::Error;
use uuid::Uuid;

use mentora_core::error::ValidationError;
use mentora_core::models::report::ReportStatus;
use mentora_store::error::StoreError;

#[derive(Debug, Error)]
pub enum JobError {
    /// The idempotency guard: a run was requested for a record that already
    /// left `pending`. The existing record is untouched.
    #[error("report {id} already started (status: {status})")]
    AlreadyStarted { id: Uuid, status: ReportStatus },

    #[error("report {id} not found")]
    NotFound { id: Uuid },

    #[error("not permitted to access this report")]
    Forbidden,

    /// Download requested before the report reached `completed`.
    #[error("report is not ready for download (status: {status})")]
    NotReady { status: ReportStatus },

    /// The run blew through the hard deadline and was aborted. The record is
    /// intentionally left `processing` for the stalled sweep.
    #[error("report job exceeded the hard deadline and was aborted")]
    HardDeadline,

    #[error("report queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
