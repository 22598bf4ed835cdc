//! Strategy registry keyed by `(report_type, format)`.
//!
//! Every pair is registered explicitly at startup and the registry is
//! verified complete before the worker pool starts, so a report type
//! without a renderer for some format is a boot failure, not a runtime
//! surprise inside a job.

use std::collections::HashMap;
use std::sync::Arc;

use mentora_core::models::report::{ReportFormat, ReportType};

use crate::Renderer;
use crate::document::DocumentRenderer;
use crate::error::ExportError;
use crate::flat::FlatRenderer;
use crate::styles::DocumentStyles;
use crate::workbook::WorkbookRenderer;

pub struct Registry {
    entries: HashMap<(ReportType, ReportFormat), Arc<dyn Renderer>>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            entries: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        report_type: ReportType,
        format: ReportFormat,
        renderer: Arc<dyn Renderer>,
    ) {
        self.entries.insert((report_type, format), renderer);
    }

    /// The standard registry: every report type in every format. Document
    /// renderers carry the per-type detail row cap.
    pub fn standard(styles: DocumentStyles) -> Result<Self, ExportError> {
        let mut registry = Registry::empty();
        let workbook: Arc<dyn Renderer> = Arc::new(WorkbookRenderer);
        let flat: Arc<dyn Renderer> = Arc::new(FlatRenderer);

        for report_type in ReportType::ALL {
            let document: Arc<dyn Renderer> = Arc::new(DocumentRenderer::new(
                styles.clone(),
                detail_row_cap(report_type),
            ));
            registry.register(report_type, ReportFormat::Pdf, document);
            registry.register(report_type, ReportFormat::Excel, Arc::clone(&workbook));
            registry.register(report_type, ReportFormat::Csv, Arc::clone(&flat));
        }

        registry.verify()?;
        Ok(registry)
    }

    /// Check that every `(type, format)` pair has a renderer.
    pub fn verify(&self) -> Result<(), ExportError> {
        let mut missing = Vec::new();
        for report_type in ReportType::ALL {
            for format in ReportFormat::ALL {
                if !self.entries.contains_key(&(report_type, format)) {
                    missing.push(format!("({report_type}, {format})"));
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExportError::IncompleteRegistry { missing })
        }
    }

    pub fn renderer(
        &self,
        report_type: ReportType,
        format: ReportFormat,
    ) -> Result<Arc<dyn Renderer>, ExportError> {
        self.entries
            .get(&(report_type, format))
            .cloned()
            .ok_or(ExportError::UnsupportedPair {
                report_type,
                format,
            })
    }
}

/// Document-format row cap per report type. The workbook export always
/// carries the full data.
fn detail_row_cap(report_type: ReportType) -> usize {
    match report_type {
        ReportType::UserProgress => 20,
        ReportType::LearningAnalytics => 10,
        ReportType::AiUsage => 15,
        // One row per day of the month.
        ReportType::MonthlySummary => 31,
        ReportType::CustomReport => 20,
    }
}
