//! Core Operation types for directory group provisioning

use serde::{Deserialize, Serialize};

/// Represents a single call that is issued against the directory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a new mail-enabled group
    CreateGroup {
        /// Primary address of the group (e.g., "sales@contoso.com")
        address: String,
        /// Members passed inline with the create call (batch mode only)
        members: Vec<String>,
    },
    /// Add a single member to an existing group
    /// POST /groups(id)/members/$ref
    AddMember {
        /// Address of the group receiving the member
        group: String,
        /// Member identity as written in the spreadsheet (usually a UPN)
        member: String,
    },
    /// Show or hide the group in address lists
    /// PATCH /groups(id) with {"hideFromAddressLists": bool}
    SetHidden {
        /// Address of the group
        group: String,
        /// Whether the group is hidden
        hidden: bool,
    },
}

/// Result of executing an Operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The operation that was executed
    pub operation: Operation,
    /// Whether the operation succeeded
    pub success: bool,
    /// Error message if operation failed, verbatim from upstream
    pub error: Option<String>,
}

impl Operation {
    /// Create a new CreateGroup operation
    pub fn create_group(address: impl Into<String>, members: Vec<String>) -> Self {
        Self::CreateGroup {
            address: address.into(),
            members,
        }
    }

    /// Create a new AddMember operation
    pub fn add_member(group: impl Into<String>, member: impl Into<String>) -> Self {
        Self::AddMember {
            group: group.into(),
            member: member.into(),
        }
    }

    /// Create a new SetHidden operation
    pub fn set_hidden(group: impl Into<String>, hidden: bool) -> Self {
        Self::SetHidden {
            group: group.into(),
            hidden,
        }
    }

    /// Get the group address this operation targets
    pub fn group(&self) -> &str {
        match self {
            Self::CreateGroup { address, .. } => address,
            Self::AddMember { group, .. } => group,
            Self::SetHidden { group, .. } => group,
        }
    }

    /// Get the HTTP method the Graph adapter uses for this operation
    pub fn http_method(&self) -> &'static str {
        match self {
            Self::CreateGroup { .. } => "POST",
            Self::AddMember { .. } => "POST",
            Self::SetHidden { .. } => "PATCH",
        }
    }

    /// Get the operation type as a string
    pub fn operation_type(&self) -> &'static str {
        match self {
            Self::CreateGroup { .. } => "create_group",
            Self::AddMember { .. } => "add_member",
            Self::SetHidden { .. } => "set_hidden",
        }
    }
}

impl OperationResult {
    /// Create a new successful result
    pub fn success(operation: Operation) -> Self {
        Self {
            operation,
            success: true,
            error: None,
        }
    }

    /// Create a new error result
    pub fn error(operation: Operation, error: String) -> Self {
        Self {
            operation,
            success: false,
            error: Some(error),
        }
    }

    /// Build a result from the outcome of a directory call
    pub fn from_outcome<T>(operation: Operation, outcome: &anyhow::Result<T>) -> Self {
        match outcome {
            Ok(_) => Self::success(operation),
            Err(err) => Self::error(operation, err.to_string()),
        }
    }

    /// Check if this result represents a successful operation
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Check if this result represents a failed operation
    pub fn is_error(&self) -> bool {
        !self.success
    }
}
