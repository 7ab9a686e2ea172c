//! Configuration loading
//!
//! Settings come from, in increasing priority: built-in defaults, the
//! TOML config file, `GROUPS_*` environment variables (a `.env` file is
//! honoured), and command-line flags.

pub mod credentials;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::{DEFAULT_GRAPH_URL, Restriction};
use crate::provision::{ProcessorOptions, ProvisionMode};

pub use credentials::resolve_principal;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";

pub mod env_vars {
    pub const TENANT_ID: &str = "GROUPS_TENANT_ID";
    pub const CLIENT_ID: &str = "GROUPS_CLIENT_ID";
    pub const CLIENT_SECRET: &str = "GROUPS_CLIENT_SECRET";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub directory: DirectoryConfig,
    pub provisioning: ProvisioningConfig,
}

/// Connection settings for the directory service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    /// Prefer GROUPS_CLIENT_SECRET over storing this in the file
    pub client_secret: Option<String>,
    pub authority: String,
    pub graph_url: String,
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            authority: DEFAULT_AUTHORITY.to_string(),
            graph_url: DEFAULT_GRAPH_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

/// How groups are created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    pub mode: ProvisionMode,
    pub hide_from_address_lists: bool,
    pub join_restriction: Restriction,
    pub depart_restriction: Restriction,
    /// Write a CSV log here after every run
    pub csv_log: Option<PathBuf>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            mode: ProvisionMode::Incremental,
            hide_from_address_lists: true,
            join_restriction: Restriction::Closed,
            depart_restriction: Restriction::Closed,
            csv_log: None,
        }
    }
}

impl ProvisioningConfig {
    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            mode: self.mode,
            hide_from_address_lists: self.hide_from_address_lists,
            join_restriction: self.join_restriction,
            depart_restriction: self.depart_restriction,
        }
    }
}

impl Config {
    /// `<config dir>/groups-cli/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("groups-cli").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Load from an explicit path (which must exist) or the default
    /// location (which may be absent).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file does not exist: {}", path.display());
            }
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply GROUPS_* overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(tenant) = get(env_vars::TENANT_ID) {
            self.directory.tenant_id = Some(tenant);
        }
        if let Some(client) = get(env_vars::CLIENT_ID) {
            self.directory.client_id = Some(client);
        }
        if let Some(secret) = get(env_vars::CLIENT_SECRET) {
            self.directory.client_secret = Some(secret);
        }
    }
}
