use mentora_core::models::report::ReportStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("report not found: {id}")]
    NotFound { id: Uuid },

    #[error("illegal status transition for report {id}: {from} -> {to}")]
    InvalidTransition {
        id: Uuid,
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("report {id} is {status}, artifact expiry needs a completed report")]
    NotExpirable { id: Uuid, status: ReportStatus },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
