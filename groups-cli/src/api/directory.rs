//! The directory service seam used by the row processor

use anyhow::Result;
use async_trait::async_trait;

use super::models::{GroupHandle, GroupRequest};

/// Operations the provisioner needs from a directory service.
///
/// Errors are returned as-is from the upstream service; callers record
/// `err.to_string()` verbatim.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Create a group. Members in `request.members` are added as part of the call.
    async fn create_group(&self, request: &GroupRequest) -> Result<GroupHandle>;

    /// Add one member identity to an existing group
    async fn add_member(&self, group: &GroupHandle, member: &str) -> Result<()>;

    /// Hide or show the group in address lists
    async fn set_hidden(&self, group: &GroupHandle, hidden: bool) -> Result<()>;
}
