//! Core types for group provisioning

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::OperationResult;

/// Details text written for rows that provisioned without any issue
pub const SUCCESS_DETAILS: &str = "Group created successfully.";

/// Separator between issue messages in the Details cell
pub const DETAILS_SEPARATOR: &str = "; ";

/// One group definition read from a spreadsheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    /// 1-based spreadsheet row number
    pub row: usize,
    pub address: String,
    pub display_name: String,
    pub owner: Option<String>,
    /// Non-blank member identities, in column order
    pub members: Vec<String>,
}

/// Final status of a processed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    Created,
    CreatedWithIssues,
    NotCreated,
}

impl RowStatus {
    /// Whether the group exists in the directory after this row
    pub fn group_exists(&self) -> bool {
        !matches!(self, RowStatus::NotCreated)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Created => write!(f, "Created"),
            RowStatus::CreatedWithIssues => write!(f, "Created with issues"),
            RowStatus::NotCreated => write!(f, "Not created"),
        }
    }
}

/// Result of processing one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutcome {
    pub row: usize,
    pub group_address: String,
    pub status: RowStatus,
    /// Issue messages, or the success sentence
    pub details: Vec<String>,
    /// Every directory call made for the row, in order
    pub operations: Vec<OperationResult>,
}

impl RowOutcome {
    /// Derive the outcome from the recorded directory calls.
    ///
    /// The first operation is always the create call.
    pub fn from_operations(spec: &GroupSpec, operations: Vec<OperationResult>) -> Self {
        let created = operations.first().is_some_and(OperationResult::is_success);
        let issues: Vec<String> = operations
            .iter()
            .filter_map(|op| op.error.clone())
            .collect();

        let status = if !created {
            RowStatus::NotCreated
        } else if issues.is_empty() {
            RowStatus::Created
        } else {
            RowStatus::CreatedWithIssues
        };

        let details = if issues.is_empty() {
            vec![SUCCESS_DETAILS.to_string()]
        } else {
            issues
        };

        Self {
            row: spec.row,
            group_address: spec.address.clone(),
            status,
            details,
            operations,
        }
    }

    /// Add an issue that no directory call reported
    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        if self.status == RowStatus::Created {
            self.status = RowStatus::CreatedWithIssues;
            self.details.clear();
        }
        self.details.push(issue.into());
        self
    }

    /// Human readable details for the Details cell
    pub fn details_text(&self) -> String {
        self.details.join(DETAILS_SEPARATOR)
    }

    /// Members whose add call failed
    pub fn failed_members(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().filter_map(|op| match &op.operation {
            crate::api::Operation::AddMember { member, .. } if op.is_error() => {
                Some(member.as_str())
            }
            _ => None,
        })
    }
}

/// Lifecycle of a single row.
///
/// `Pending -> Creating -> {AddingMembers, Done(NotCreated)}` and
/// `AddingMembers -> Done(Created | CreatedWithIssues)`. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Pending,
    Creating,
    /// Group exists; members and visibility are being applied
    AddingMembers,
    Done(RowStatus),
}

impl RowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RowState::Done(_))
    }

    pub fn can_transition_to(&self, next: RowState) -> bool {
        match (self, next) {
            (RowState::Pending, RowState::Creating) => true,
            (RowState::Creating, RowState::AddingMembers) => true,
            (RowState::Creating, RowState::Done(RowStatus::NotCreated)) => true,
            (RowState::AddingMembers, RowState::Done(status)) => status.group_exists(),
            _ => false,
        }
    }

    /// Move to `next`, refusing transitions the lifecycle does not allow
    pub fn advance(&mut self, next: RowState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            log::warn!("Ignoring invalid row transition {:?} -> {:?}", self, next);
            false
        }
    }
}
