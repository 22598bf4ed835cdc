//! mentora-export
//!
//! Format renderers: structured result set in, downloadable file out.
//! Three strategies (document/PDF, workbook/XLSX, flat table/CSV) behind a
//! registry keyed by `(report_type, format)`, verified complete at startup.

pub mod document;
pub mod error;
pub mod flat;
pub mod registry;
pub mod styles;
pub mod workbook;

use std::path::Path;

use jiff::Timestamp;

use mentora_core::dataset::DataSet;
use mentora_core::models::report::Report;

use crate::error::ExportError;

/// One output-format strategy. Implementations must succeed on zero-row
/// result sets, producing a valid empty-content file.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        report: &Report,
        generated_at: Timestamp,
        data: &DataSet,
        out: &Path,
    ) -> Result<(), ExportError>;
}
