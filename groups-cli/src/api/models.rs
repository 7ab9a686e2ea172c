//! Data models for the directory API

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Who may join or leave a group without approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    Open,
    #[default]
    Closed,
    ApprovalRequired,
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Open => write!(f, "Open"),
            Restriction::Closed => write!(f, "Closed"),
            Restriction::ApprovalRequired => write!(f, "ApprovalRequired"),
        }
    }
}

/// Everything needed to create one group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRequest {
    pub display_name: String,
    pub address: String,
    pub owner: Option<String>,
    pub join_restriction: Restriction,
    pub depart_restriction: Restriction,
    /// Members created together with the group. Empty in incremental mode.
    pub members: Vec<String>,
}

impl GroupRequest {
    /// Mail nickname derived from the local part of the address
    pub fn mail_nickname(&self) -> &str {
        self.address
            .split_once('@')
            .map(|(local, _)| local)
            .unwrap_or(&self.address)
    }
}

/// A group that exists in the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupHandle {
    /// Directory object id
    pub id: String,
    /// Address the group was requested with
    pub address: String,
    pub display_name: String,
    /// Address the directory reported for the new group, if any
    pub mail: Option<String>,
}

impl GroupHandle {
    /// The assigned address when it differs from the requested one
    pub fn assigned_elsewhere(&self) -> Option<&str> {
        self.mail
            .as_deref()
            .filter(|mail| !mail.eq_ignore_ascii_case(&self.address))
    }
}

/// App identity used to open a directory session
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Bearer token held by an open session
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: Instant,
}

impl TokenInfo {
    /// Tokens are refreshed this long before they actually expire
    pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

    pub fn is_valid(&self) -> bool {
        self.expires_at > Instant::now() + Self::REFRESH_MARGIN
    }
}

// Graph wire types

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateGroupBody {
    pub display_name: String,
    pub mail_nickname: String,
    pub mail_enabled: bool,
    pub security_enabled: bool,
    pub group_types: Vec<String>,
    pub visibility: String,
    #[serde(rename = "owners@odata.bind", skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
    #[serde(rename = "members@odata.bind", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphGroup {
    pub id: String,
    #[serde(default)]
    pub mail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphObjectId {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DirectoryObjectRef {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HideFromAddressListsBody {
    pub hide_from_address_lists: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorEnvelope {
    pub error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
