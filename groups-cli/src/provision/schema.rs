//! Header-driven column schema for group spreadsheets
//!
//! Columns are found by header name rather than position:
//! - address: "Address", "Email", "Group Address", "PrimarySmtpAddress", "Mail"
//! - display name: "Display Name", "Name", "Group Name"
//! - owner (optional): "Owner", "Moderator", "ManagedBy"
//! - "Status" / "Details" are annotation columns and never read as data
//! - "Member", "Members", "Member 1", ... and blank headers hold member identities
//!
//! Any other named column is ignored.

use anyhow::{Result, bail};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::types::GroupSpec;

const ADDRESS_HEADERS: &[&str] = &["address", "email", "groupaddress", "primarysmtpaddress", "mail"];
const DISPLAY_NAME_HEADERS: &[&str] = &["displayname", "name", "groupname"];
const OWNER_HEADERS: &[&str] = &["owner", "moderator", "managedby"];

pub const STATUS_HEADER: &str = "Status";
pub const DETAILS_HEADER: &str = "Details";

static MEMBER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^members?\d*$").expect("valid member header regex"));

/// Lowercase and drop spaces, underscores and dashes
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolved column positions (0-based)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub address: usize,
    pub display_name: usize,
    pub owner: Option<usize>,
    pub status: Option<usize>,
    pub details: Option<usize>,
    /// Named columns that are neither data nor members
    ignored: HashSet<usize>,
}

impl ColumnMap {
    /// Resolve columns from the header row
    pub fn resolve(headers: &[String]) -> Result<Self> {
        let mut address = None;
        let mut display_name = None;
        let mut owner = None;
        let mut status = None;
        let mut details = None;
        let mut ignored = HashSet::new();

        for (col, header) in headers.iter().enumerate() {
            let name = normalize_header(header);
            if name.is_empty() || MEMBER_HEADER.is_match(&name) {
                continue;
            }

            let slot = if ADDRESS_HEADERS.contains(&name.as_str()) {
                &mut address
            } else if DISPLAY_NAME_HEADERS.contains(&name.as_str()) {
                &mut display_name
            } else if OWNER_HEADERS.contains(&name.as_str()) {
                &mut owner
            } else if name == "status" {
                &mut status
            } else if name == "details" {
                &mut details
            } else {
                log::warn!("Ignoring unrecognised column '{}'", header.trim());
                ignored.insert(col);
                continue;
            };

            if slot.is_some() {
                log::warn!("Duplicate column '{}' ignored", header.trim());
                ignored.insert(col);
            } else {
                *slot = Some(col);
            }
        }

        let Some(address) = address else {
            bail!(
                "Missing address column (expected one of: Address, Email, Group Address, PrimarySmtpAddress, Mail)"
            );
        };
        let Some(display_name) = display_name else {
            bail!("Missing display name column (expected one of: Display Name, Name, Group Name)");
        };

        Ok(Self {
            address,
            display_name,
            owner,
            status,
            details,
            ignored,
        })
    }

    fn is_member_col(&self, col: usize) -> bool {
        col != self.address
            && col != self.display_name
            && Some(col) != self.owner
            && Some(col) != self.status
            && Some(col) != self.details
            && !self.ignored.contains(&col)
    }

    /// Whether the input already carries annotations from an earlier run
    pub fn has_annotations(&self) -> bool {
        self.status.is_some()
    }

    /// Build a GroupSpec from one data row.
    ///
    /// Returns None when the address cell is blank.
    pub fn group_spec(&self, row: usize, cells: &[String]) -> Option<GroupSpec> {
        let cell = |col: usize| cells.get(col).map(|s| s.trim()).unwrap_or("");

        let address = cell(self.address);
        if address.is_empty() {
            return None;
        }

        let display_name = match cell(self.display_name) {
            "" => address,
            name => name,
        };

        let owner = self
            .owner
            .map(cell)
            .filter(|o| !o.is_empty())
            .map(str::to_string);

        let members = (0..cells.len())
            .filter(|col| self.is_member_col(*col))
            .map(cell)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        Some(GroupSpec {
            row,
            address: address.to_string(),
            display_name: display_name.to_string(),
            owner,
            members,
        })
    }
}
