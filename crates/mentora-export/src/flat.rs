//! The flat-table (CSV) renderer: exactly one flattened table per report,
//! taken from the result set's primary group. Lossy by design — secondary
//! groups only exist in the document and workbook formats.

use std::path::Path;

use csv::WriterBuilder;
use jiff::Timestamp;

use mentora_core::dataset::DataSet;
use mentora_core::models::report::Report;

use crate::Renderer;
use crate::error::ExportError;

pub struct FlatRenderer;

impl Renderer for FlatRenderer {
    fn render(
        &self,
        _report: &Report,
        _generated_at: Timestamp,
        data: &DataSet,
        out: &Path,
    ) -> Result<(), ExportError> {
        let mut writer = WriterBuilder::new().from_path(out)?;

        if let Some(group) = data.primary_group() {
            writer.write_record(&group.columns)?;
            for row in &group.rows {
                writer.write_record(row.iter().map(|cell| cell.to_string()))?;
            }
        }

        writer.flush().map_err(|e| ExportError::Flat(e.to_string()))?;
        Ok(())
    }
}
