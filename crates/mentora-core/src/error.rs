use thiserror::Error;

/// Submission-time parameter rejection. Surfaced synchronously to the
/// caller; a report record is never created for an invalid request.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("date_from {from} is after date_to {to}")]
    InvertedDateRange {
        from: jiff::civil::Date,
        to: jiff::civil::Date,
    },

    #[error("month must be between 1 and 12, got {0}")]
    MonthOutOfRange(i8),

    #[error("year must be between 1 and 9999, got {0}")]
    YearOutOfRange(i16),

    #[error("custom report needs at least two sections, got {0}")]
    TooFewSections(usize),

    #[error("custom report section listed twice: {0}")]
    DuplicateSection(String),

    #[error("custom report cannot nest another custom report")]
    NestedCustomReport,
}
