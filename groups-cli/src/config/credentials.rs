//! Resolve the app principal used to open the directory session

use anyhow::{Context, Result, bail};

use super::{DirectoryConfig, env_vars};
use crate::api::Principal;

/// Build the principal from config, prompting for the client secret
/// when it is missing and a terminal is attached.
pub fn resolve_principal(config: &DirectoryConfig, interactive: bool) -> Result<Principal> {
    let tenant_id = required(&config.tenant_id, "tenant_id", env_vars::TENANT_ID)?;
    let client_id = required(&config.client_id, "client_id", env_vars::CLIENT_ID)?;

    let client_secret = match config.client_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => secret.to_string(),
        None if interactive => {
            let secret = rpassword::prompt_password(format!("Client secret for {}: ", client_id))
                .context("Failed to read client secret")?;
            if secret.trim().is_empty() {
                bail!("No client secret provided");
            }
            secret
        }
        None => bail!(
            "Missing client secret: set {} or client_secret in the config file",
            env_vars::CLIENT_SECRET
        ),
    };

    Ok(Principal {
        tenant_id,
        client_id,
        client_secret,
    })
}

fn required(value: &Option<String>, key: &str, env_var: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => bail!(
            "Missing directory {}: set {} or [directory].{} in the config file",
            key,
            env_var,
            key
        ),
    }
}
