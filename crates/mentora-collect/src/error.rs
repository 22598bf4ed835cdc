use mentora_core::analytics::AnalyticsError;
use thiserror::Error;

/// Collection failure. The job runner maps this to the `failed` terminal
/// state with the message as the record's `error_message`.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}
