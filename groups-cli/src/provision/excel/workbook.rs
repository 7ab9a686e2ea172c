//! In-memory spreadsheet that rows are annotated into
//!
//! The input file is never modified. Results go to a copy written with
//! `save_as`; later `save` calls overwrite that copy.

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::reader::{SheetData, read_sheet};
use super::writer::write_sheet;
use crate::provision::types::RowStatus;

#[derive(Debug)]
pub struct Spreadsheet {
    source: PathBuf,
    saved_to: Option<PathBuf>,
    sheet: SheetData,
    fills: HashMap<usize, RowStatus>,
    autofit: bool,
}

impl Spreadsheet {
    /// Open a workbook (first sheet) or CSV file
    pub fn open(path: &Path) -> Result<Self> {
        let sheet = read_sheet(path)?;
        Ok(Self::from_sheet(path, sheet))
    }

    pub fn from_sheet(source: &Path, sheet: SheetData) -> Self {
        Self {
            source: source.to_path_buf(),
            saved_to: None,
            sheet,
            fills: HashMap::new(),
            autofit: false,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet.name
    }

    /// Number of rows including the header
    pub fn row_count(&self) -> usize {
        self.sheet.rows.len()
    }

    /// Width of the widest row
    pub fn column_count(&self) -> usize {
        self.sheet.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// The header row, empty if the sheet is empty
    pub fn headers(&self) -> &[String] {
        self.sheet.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn row(&self, row: usize) -> &[String] {
        self.sheet.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell text, "" for cells outside the used range
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.row(row).get(col).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if self.sheet.rows.len() <= row {
            self.sheet.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.sheet.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.into();
    }

    /// Colour the whole row according to `status`
    pub fn set_row_fill(&mut self, row: usize, status: RowStatus) {
        self.fills.insert(row, status);
    }

    pub fn row_fill(&self, row: usize) -> Option<RowStatus> {
        self.fills.get(&row).copied()
    }

    /// Size columns to their content when saving
    pub fn autofit(&mut self) {
        self.autofit = true;
    }

    /// Fail if `path` cannot be used for `save_as`
    pub fn check_output(&self, path: &Path) -> Result<()> {
        if same_file(path, &self.source) {
            bail!(
                "Refusing to overwrite the input file: {}",
                self.source.display()
            );
        }
        Ok(())
    }

    /// Write the sheet to a new file and make it the target of `save`
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.check_output(path)?;

        write_sheet(&self.sheet, &self.fills, self.autofit, path)
            .with_context(|| format!("Failed to save results to: {}", path.display()))?;

        log::info!("Saved annotated copy to {}", path.display());
        self.saved_to = Some(path.to_path_buf());
        Ok(())
    }

    /// Write again to the path of the last `save_as`
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .saved_to
            .clone()
            .context("Spreadsheet has not been saved yet, use save_as first")?;
        self.save_as(&path)
    }

    /// Release the in-memory copy, returning where it was saved
    pub fn close(self) -> Option<PathBuf> {
        log::debug!("Closing spreadsheet {}", self.source.display());
        self.saved_to
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Default path of the annotated copy: `<stem>_results.xlsx` beside the input
pub fn results_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("groups");
    input.with_file_name(format!("{}_results.xlsx", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Spreadsheet {
        Spreadsheet::from_sheet(
            Path::new("groups.xlsx"),
            SheetData {
                name: "Groups".to_string(),
                rows: vec![
                    vec!["Address".to_string(), "Name".to_string()],
                    vec!["sales@contoso.com".to_string(), "Sales".to_string()],
                ],
            },
        )
    }

    #[test]
    fn test_text_and_set_value() {
        let mut sheet = sheet();
        assert_eq!(sheet.text(1, 0), "sales@contoso.com");
        assert_eq!(sheet.text(1, 5), "");
        assert_eq!(sheet.text(9, 0), "");

        sheet.set_value(1, 3, "Created");
        assert_eq!(sheet.text(1, 3), "Created");
        assert_eq!(sheet.text(1, 2), "");
        assert_eq!(sheet.column_count(), 4);

        sheet.set_value(4, 0, "x");
        assert_eq!(sheet.row_count(), 5);
    }

    #[test]
    fn test_row_fill() {
        let mut sheet = sheet();
        assert_eq!(sheet.row_fill(1), None);
        sheet.set_row_fill(1, RowStatus::NotCreated);
        assert_eq!(sheet.row_fill(1), Some(RowStatus::NotCreated));
    }

    #[test]
    fn test_results_path() {
        assert_eq!(
            results_path(Path::new("/data/groups.xlsx")),
            PathBuf::from("/data/groups_results.xlsx")
        );
        assert_eq!(
            results_path(Path::new("groups.csv")),
            PathBuf::from("groups_results.xlsx")
        );
    }

    #[test]
    fn test_save_requires_save_as() {
        let mut sheet = sheet();
        assert!(sheet.save().is_err());
    }

    #[test]
    fn test_save_as_refuses_input_path() {
        let mut sheet = sheet();
        assert!(sheet.check_output(Path::new("groups.xlsx")).is_err());
        assert!(sheet.check_output(Path::new("groups_results.xlsx")).is_ok());

        let err = sheet.save_as(Path::new("groups.xlsx")).unwrap_err();
        assert!(err.to_string().contains("Refusing to overwrite"));
        assert_eq!(sheet.close(), None);
    }
}
