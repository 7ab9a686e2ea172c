//! Run-wide result tracking, console summary and CSV log

use anyhow::{Context, Result};
use colored::*;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::path::Path;

use super::types::{RowOutcome, RowStatus};

/// Default file name of the CSV log
pub const DEFAULT_CSV_LOG: &str = "group_provisioning_log.csv";

/// One line of the CSV log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupLogEntry {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Status", serialize_with = "serialize_label")]
    pub status: RowStatus,
    #[serde(rename = "Details")]
    pub details: String,
    #[serde(skip)]
    pub row: usize,
}

/// Everything learned during a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Groups that exist after the run, with or without issues
    pub created_groups: BTreeSet<String>,
    pub failed_groups: BTreeSet<String>,
    pub failed_members: BTreeSet<String>,
    /// Per-group results in processing order
    pub outcomes: Vec<GroupLogEntry>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        if outcome.status.group_exists() {
            self.created_groups.insert(outcome.group_address.clone());
        } else {
            self.failed_groups.insert(outcome.group_address.clone());
        }

        for member in outcome.failed_members() {
            self.failed_members.insert(member.to_string());
        }

        self.outcomes.push(GroupLogEntry {
            group: outcome.group_address.clone(),
            status: outcome.status,
            details: outcome.details_text(),
            row: outcome.row,
        });
    }

    pub fn count(&self, status: RowStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Whether any row ended in something other than a clean create
    pub fn has_failures(&self) -> bool {
        !self.failed_groups.is_empty()
            || self.count(RowStatus::CreatedWithIssues) > 0
    }
}

/// Collects row outcomes and prints the end-of-run report
#[derive(Debug, Default)]
pub struct RunReporter {
    summary: RunSummary,
    echo_rows: bool,
}

impl RunReporter {
    /// `echo_rows` prints one console line per finished row
    pub fn new(echo_rows: bool) -> Self {
        Self {
            summary: RunSummary::default(),
            echo_rows,
        }
    }

    pub fn record(&mut self, outcome: &RowOutcome) {
        self.summary.record(outcome);

        if self.echo_rows {
            println!(
                "  Row {:<4} {:<40} {}",
                outcome.row,
                outcome.group_address,
                colorize_status(outcome.status)
            );
            if outcome.status != RowStatus::Created {
                for detail in &outcome.details {
                    println!("           {}", detail.dimmed());
                }
            }
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Print counts and listings to stdout
    pub fn print_summary(&self) {
        print!("{}", self.render_summary());
    }

    fn render_summary(&self) -> String {
        let summary = &self.summary;
        let mut out = String::new();

        out.push('\n');
        out.push_str(&format!("{}\n", "Provisioning summary".bold()));
        out.push_str(&format!(
            "  {} {}\n",
            "Groups created:".bright_green(),
            summary.created_groups.len()
        ));
        out.push_str(&format!(
            "    with issues: {}\n",
            summary.count(RowStatus::CreatedWithIssues)
        ));
        out.push_str(&format!(
            "  {} {}\n",
            "Groups failed: ".bright_red(),
            summary.failed_groups.len()
        ));
        out.push_str(&format!(
            "  {} {}\n",
            "Members failed:".yellow(),
            summary.failed_members.len()
        ));

        render_list(&mut out, "Created groups", &summary.created_groups);
        render_list(&mut out, "Failed groups", &summary.failed_groups);
        render_list(&mut out, "Failed members", &summary.failed_members);
        out
    }

    /// Write `Group,Status,Details` for every processed row
    pub fn write_csv_log(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create CSV log: {}", path.display()))?;

        for entry in &self.summary.outcomes {
            writer
                .serialize(entry)
                .with_context(|| format!("Failed to write CSV log: {}", path.display()))?;
        }

        writer
            .flush()
            .with_context(|| format!("Failed to write CSV log: {}", path.display()))?;

        log::info!(
            "Wrote {} entries to CSV log {}",
            self.summary.outcomes.len(),
            path.display()
        );
        Ok(())
    }
}

/// Statuses are logged with the same wording as the Status column
fn serialize_label<S: Serializer>(status: &RowStatus, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}

fn render_list(out: &mut String, title: &str, items: &BTreeSet<String>) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}:\n", title.bold()));
    for item in items {
        out.push_str(&format!("  - {}\n", item));
    }
}

pub fn colorize_status(status: RowStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        RowStatus::Created => label.bright_green(),
        RowStatus::CreatedWithIssues => label.yellow(),
        RowStatus::NotCreated => label.bright_red(),
    }
}
