use mentora_core::models::report::{ReportFormat, ReportType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no renderer registered for ({report_type}, {format})")]
    UnsupportedPair {
        report_type: ReportType,
        format: ReportFormat,
    },

    #[error("renderer registry is missing pairs: {}", missing.join(", "))]
    IncompleteRegistry { missing: Vec<String> },

    #[error("PDF generation failed: {0}")]
    Document(String),

    #[error("workbook generation failed: {0}")]
    Workbook(String),

    #[error("CSV generation failed: {0}")]
    Flat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        ExportError::Workbook(e.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Flat(e.to_string())
    }
}
