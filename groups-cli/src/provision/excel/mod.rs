//! Spreadsheet input and annotated output

pub mod reader;
pub mod workbook;
pub mod writer;

pub use reader::{SheetData, read_sheet};
pub use workbook::{Spreadsheet, results_path};
pub use writer::{fill_color, write_sheet};
