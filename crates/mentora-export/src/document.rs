//! The document (PDF) renderer: a paginated report with a title block,
//! metadata, and one section per result group. Long listings are truncated
//! to a per-type row cap with an explicit pointer at the spreadsheet export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use jiff::Timestamp;
use jiff::tz::TimeZone;
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use mentora_core::dataset::{DataSet, TableGroup};
use mentora_core::models::report::Report;

use crate::Renderer;
use crate::error::ExportError;
use crate::styles::DocumentStyles;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;

pub struct DocumentRenderer {
    styles: DocumentStyles,
    /// Deterministic cap on detail rows per section for this report type.
    detail_row_cap: usize,
}

impl DocumentRenderer {
    pub fn new(styles: DocumentStyles, detail_row_cap: usize) -> Self {
        DocumentRenderer {
            styles,
            detail_row_cap,
        }
    }
}

impl Renderer for DocumentRenderer {
    fn render(
        &self,
        report: &Report,
        generated_at: Timestamp,
        data: &DataSet,
        out: &Path,
    ) -> Result<(), ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(&report.title, Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "content");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Document(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Document(e.to_string()))?;

        let mut writer = PageWriter {
            layer: doc.get_page(page).get_layer(layer),
            doc: &doc,
            font,
            bold,
            margin: self.styles.margin_mm,
            y: PAGE_HEIGHT_MM - self.styles.margin_mm,
        };

        // Title and metadata block.
        writer.line(&report.title, self.styles.title_size, true);
        writer.gap(4.0);
        let stamp = generated_at.to_zoned(TimeZone::UTC).strftime("%Y-%m-%d %H:%M");
        writer.line(&format!("Generated at: {stamp} UTC"), self.styles.body_size, false);
        writer.line(
            &format!("Generated by: {}", report.created_by),
            self.styles.body_size,
            false,
        );
        writer.line(
            &format!("Report type: {}", report.report_type),
            self.styles.body_size,
            false,
        );
        writer.gap(6.0);

        for group in &data.groups {
            self.section(&mut writer, group);
        }

        let file = File::create(out)?;
        doc.save(&mut BufWriter::new(file))
            .map_err(|e| ExportError::Document(e.to_string()))?;
        Ok(())
    }
}

impl DocumentRenderer {
    fn section(&self, writer: &mut PageWriter<'_>, group: &TableGroup) {
        writer.ensure_space(20.0);
        writer.line(&group.title, self.styles.heading_size, true);
        writer.gap(2.0);

        if group.summary {
            // Label/value block: the single aggregate row, transposed.
            let empty = Vec::new();
            let row = group.rows.first().unwrap_or(&empty);
            for (i, label) in group.columns.iter().enumerate() {
                let value = row.get(i).map(|c| c.to_string()).unwrap_or_default();
                writer.line(&format!("{label}: {value}"), self.styles.body_size, false);
            }
        } else {
            let usable = PAGE_WIDTH_MM - 2.0 * self.styles.margin_mm;
            let cols = group.columns.len().max(1);
            let col_width = usable / cols as f64;
            // Rough character budget per column at body size.
            let max_chars = ((col_width / 1.9) as usize).max(4);

            writer.columns(&group.columns, col_width, max_chars, self.styles.body_size, true);
            for row in group.rows.iter().take(self.detail_row_cap) {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                writer.columns(&cells, col_width, max_chars, self.styles.body_size, false);
            }

            if group.rows.len() > self.detail_row_cap {
                writer.gap(1.0);
                writer.line(
                    &format!(
                        "Showing first {} of {} rows; see spreadsheet export for full data.",
                        self.detail_row_cap,
                        group.rows.len()
                    ),
                    self.styles.body_size,
                    false,
                );
            }
        }

        writer.gap(6.0);
    }
}

/// Cursor over the current page, adding pages as content runs past the
/// bottom margin.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    margin: f64,
    y: f64,
}

impl PageWriter<'_> {
    fn ensure_space(&mut self, needed_mm: f64) {
        if self.y - needed_mm < self.margin {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM as f32), Mm(PAGE_HEIGHT_MM as f32), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - self.margin;
        }
    }

    fn advance(&mut self, size_pt: f64) -> f64 {
        // Line height: font size in points converted to mm, plus leading.
        let line_mm = size_pt * 0.3528 + 1.8;
        self.ensure_space(line_mm);
        self.y -= line_mm;
        self.y
    }

    fn line(&mut self, text: &str, size_pt: f64, bold: bool) {
        let y = self.advance(size_pt);
        let font = if bold { &self.bold } else { &self.font };
        self.layer
            .use_text(text, size_pt as f32, Mm(self.margin as f32), Mm(y as f32), font);
    }

    fn columns(&mut self, cells: &[String], col_width: f64, max_chars: usize, size_pt: f64, bold: bool) {
        let y = self.advance(size_pt);
        let font = if bold { &self.bold } else { &self.font };
        for (i, cell) in cells.iter().enumerate() {
            let x = self.margin + i as f64 * col_width;
            self.layer
                .use_text(fit(cell, max_chars), size_pt as f32, Mm(x as f32), Mm(y as f32), font);
        }
    }

    fn gap(&mut self, mm: f64) {
        self.ensure_space(mm);
        self.y -= mm;
    }
}

/// Truncate to a character budget with an ellipsis marker.
fn fit(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(2)).collect();
        format!("{kept}..")
    }
}
