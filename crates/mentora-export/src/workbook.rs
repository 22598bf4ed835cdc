//! The workbook (XLSX) renderer: one sheet per result group, full data set,
//! no truncation.

use std::path::Path;

use jiff::Timestamp;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use mentora_core::dataset::{Cell, DataSet};
use mentora_core::models::report::Report;

use crate::Renderer;
use crate::error::ExportError;

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

pub struct WorkbookRenderer;

impl Renderer for WorkbookRenderer {
    fn render(
        &self,
        _report: &Report,
        _generated_at: Timestamp,
        data: &DataSet,
        out: &Path,
    ) -> Result<(), ExportError> {
        let mut workbook = Workbook::new();

        let header_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0x4B5563))
            .set_font_color(Color::White)
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);

        if data.groups.is_empty() {
            // A workbook needs at least one sheet to be a valid file.
            workbook.add_worksheet().set_name("Report")?;
        }

        let mut used_names: Vec<String> = Vec::new();
        for group in &data.groups {
            let name = sheet_name(&group.title, &mut used_names);
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&name)?;

            for (col, column) in group.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, column, &header_format)?;
            }

            for (row, cells) in group.rows.iter().enumerate() {
                let row = (row + 1) as u32;
                for (col, cell) in cells.iter().enumerate() {
                    let col = col as u16;
                    match cell {
                        Cell::Text(s) => worksheet.write_string(row, col, s)?,
                        Cell::Int(v) => worksheet.write_number(row, col, *v as f64)?,
                        Cell::Float(v) => worksheet.write_number(row, col, *v)?,
                    };
                }
            }
        }

        workbook.save(out)?;
        Ok(())
    }
}

/// Sanitize a group title into a unique, Excel-legal sheet name.
fn sheet_name(title: &str, used: &mut Vec<String>) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            ':' | '\\' | '/' | '?' | '*' | '[' | ']' => ' ',
            other => other,
        })
        .collect();
    let mut base: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    base = base.trim().to_string();
    if base.is_empty() {
        base = "Sheet".to_string();
    }

    let mut candidate = base.clone();
    let mut counter = 2;
    while used.iter().any(|n| n == &candidate) {
        let suffix = format!(" ({counter})");
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        counter += 1;
    }
    used.push(candidate.clone());
    candidate
}
