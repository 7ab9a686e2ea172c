//! Write the annotated sheet to Excel format

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};
use std::collections::HashMap;
use std::path::Path;

use super::reader::SheetData;
use crate::provision::types::RowStatus;

/// Row fill colours
mod fills {
    pub const CREATED: u32 = 0xC6EFCE;
    pub const CREATED_WITH_ISSUES: u32 = 0xFFEB9C;
    pub const NOT_CREATED: u32 = 0xFFC7CE;
}

/// Background colour for a row with the given status
pub fn fill_color(status: RowStatus) -> Color {
    match status {
        RowStatus::Created => Color::RGB(fills::CREATED),
        RowStatus::CreatedWithIssues => Color::RGB(fills::CREATED_WITH_ISSUES),
        RowStatus::NotCreated => Color::RGB(fills::NOT_CREATED),
    }
}

/// Excel caps sheet names at 31 chars and forbids a few characters
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.trim().is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

/// Write `sheet` to `path`, colouring rows listed in `row_fills`
pub fn write_sheet(
    sheet: &SheetData,
    row_fills: &HashMap<usize, RowStatus>,
    autofit: bool,
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(&sheet.name))?;

    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);

    for (row_idx, cells) in sheet.rows.iter().enumerate() {
        let format = row_format(row_idx, row_fills);
        write_row(worksheet, row_idx as u32, cells, width, format.as_ref())?;
    }

    if autofit {
        worksheet.autofit();
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    Ok(())
}

/// Bold for the header, the status fill for annotated rows
fn row_format(row_idx: usize, row_fills: &HashMap<usize, RowStatus>) -> Option<Format> {
    if row_idx == 0 {
        return Some(Format::new().set_bold());
    }
    row_fills
        .get(&row_idx)
        .map(|status| Format::new().set_background_color(fill_color(*status)))
}

fn write_row(
    ws: &mut Worksheet,
    row: u32,
    cells: &[String],
    width: usize,
    format: Option<&Format>,
) -> Result<()> {
    match format {
        Some(format) => {
            // Formatted rows are filled across the full width, blanks included
            for col in 0..width {
                let text = cells.get(col).map(String::as_str).unwrap_or("");
                if text.is_empty() {
                    ws.write_blank(row, col as u16, format)?;
                } else {
                    ws.write_string_with_format(row, col as u16, text, format)?;
                }
            }
        }
        None => {
            for (col, text) in cells.iter().enumerate() {
                if !text.is_empty() {
                    ws.write_string(row, col as u16, text)?;
                }
            }
        }
    }
    Ok(())
}
