//! Bulk group provisioning from spreadsheets
//!
//! Reads group definitions, creates each group through a
//! [`DirectoryService`](crate::api::DirectoryService), and writes a
//! status per row into an annotated copy of the input.

pub mod excel;
pub mod processor;
pub mod report;
pub mod schema;
pub mod types;

pub use excel::{Spreadsheet, results_path};
pub use processor::{ProcessorOptions, ProvisionMode, RowProcessor, process_sheet, read_group_specs};
pub use report::{DEFAULT_CSV_LOG, RunReporter, RunSummary};
pub use schema::ColumnMap;
pub use types::*;
