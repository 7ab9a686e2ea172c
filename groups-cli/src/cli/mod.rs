//! Command-line interface

pub mod commands;
pub mod prompt;

use clap::Parser;

use commands::provision::ProvisionArgs;

#[derive(Debug, Parser)]
#[command(
    name = "groups-cli",
    version,
    about = "Create mail-enabled groups from a spreadsheet and annotate each row with the result"
)]
pub struct Cli {
    #[command(flatten)]
    pub provision: ProvisionArgs,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::provision::DisplayStyle;
    use std::path::PathBuf;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["groups-cli", "groups.xlsx"]).unwrap();
        assert_eq!(cli.provision.file, Some(PathBuf::from("groups.xlsx")));
        assert_eq!(cli.provision.csv_log, None);
        assert!(!cli.provision.batch);
        assert_eq!(cli.provision.style, DisplayStyle::Normal);
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn test_csv_log_default_value() {
        let cli = Cli::try_parse_from(["groups-cli", "--csv-log", "--", "groups.xlsx"]).unwrap();
        assert_eq!(
            cli.provision.csv_log,
            Some(PathBuf::from(crate::provision::DEFAULT_CSV_LOG))
        );

        let cli =
            Cli::try_parse_from(["groups-cli", "groups.xlsx", "--csv-log=out.csv", "-vv"]).unwrap();
        assert_eq!(cli.provision.csv_log, Some(PathBuf::from("out.csv")));
        assert_eq!(cli.log_filter(), "debug");
    }

    #[test]
    fn test_no_file_is_allowed() {
        let cli = Cli::try_parse_from(["groups-cli", "--batch", "--no-pause"]).unwrap();
        assert_eq!(cli.provision.file, None);
        assert!(cli.provision.batch);
        assert!(cli.provision.no_pause);
    }
}
