//! Provision command arguments

pub mod handler;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

pub use handler::{RunOutcome, handle_provision_command};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DisplayStyle {
    /// Summary only
    Quiet,
    /// One line per row plus the summary
    #[default]
    Normal,
    /// Also print settings and timings
    Verbose,
}

#[derive(Debug, Clone, Args)]
pub struct ProvisionArgs {
    /// Spreadsheet with one group per row (.xlsx, .xls, .ods or .csv).
    /// Prompted for when omitted.
    pub file: Option<PathBuf>,

    /// Where to save the annotated copy [default: <file>_results.xlsx]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a Group/Status/Details CSV log
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = crate::provision::DEFAULT_CSV_LOG)]
    pub csv_log: Option<PathBuf>,

    /// Pass members to the create call instead of adding them one by one
    #[arg(long)]
    pub batch: bool,

    /// Leave new groups visible in address lists
    #[arg(long)]
    pub no_hide: bool,

    /// Parse the spreadsheet and print the planned groups without calling the directory
    #[arg(long)]
    pub dry_run: bool,

    /// Config file [default: <config dir>/groups-cli/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Exit without waiting for a key press
    #[arg(long)]
    pub no_pause: bool,

    /// Console output style
    #[arg(long, value_enum, default_value_t = DisplayStyle::Normal)]
    pub style: DisplayStyle,
}
