//! Directory service API
//!
//! The provisioner talks to the directory only through the
//! [`DirectoryService`] trait. [`GraphDirectory`] implements it against
//! Microsoft Graph, using a single [`AuthManager`] session for the run.

pub mod auth;
pub mod client;
pub mod directory;
pub mod models;
pub mod operations;

#[cfg(test)]
pub mod mock;

pub use auth::{AuthManager, Session};
pub use client::{DEFAULT_GRAPH_URL, GraphApiError, GraphDirectory};
pub use directory::DirectoryService;
pub use models::{GroupHandle, GroupRequest, Principal, Restriction, TokenInfo};
pub use operations::{Operation, OperationResult};
