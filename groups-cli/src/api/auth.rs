//! Session management for the directory service
//!
//! One session is opened per run with the client credentials grant and
//! reused for every call. The bearer token is re-acquired transparently
//! when it is about to expire.

use anyhow::{Context, Result, bail};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::models::{Principal, TokenInfo, TokenResponse};

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// An authenticated directory session
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub token: TokenInfo,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.token.is_valid()
    }
}

/// Opens and keeps the directory session
pub struct AuthManager {
    http: reqwest::Client,
    authority: String,
    session: Mutex<Option<Session>>,
}

impl AuthManager {
    /// `authority` is the login host, e.g. "https://login.microsoftonline.com"
    pub fn new(http: reqwest::Client, authority: impl Into<String>) -> Self {
        Self {
            http,
            authority: authority.into().trim_end_matches('/').to_string(),
            session: Mutex::new(None),
        }
    }

    /// Whether a session with a still-valid token exists
    pub async fn has_open_session(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(Session::is_open)
    }

    /// Open a session for the given principal, replacing any previous one
    pub async fn open_session(&self, principal: &Principal) -> Result<Session> {
        let token = self.request_token(principal).await?;
        let session = Session {
            principal: principal.clone(),
            token,
        };

        log::info!(
            "Opened directory session for client {} in tenant {}",
            principal.client_id,
            principal.tenant_id
        );

        *self.session.lock().await = Some(session.clone());
        Ok(session)
    }

    /// Get a bearer token, refreshing the session if it has expired
    pub async fn access_token(&self) -> Result<String> {
        let mut guard = self.session.lock().await;
        let session = match guard.as_mut() {
            Some(session) => session,
            None => bail!("No open directory session"),
        };

        if !session.is_open() {
            log::debug!("Directory token expired, requesting a new one");
            session.token = self.request_token(&session.principal).await?;
        }

        Ok(session.token.access_token.clone())
    }

    async fn request_token(&self, principal: &Principal) -> Result<TokenInfo> {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, principal.tenant_id
        );
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", principal.client_id.as_str()),
            ("client_secret", principal.client_secret.as_str()),
            ("scope", GRAPH_SCOPE),
        ];

        let response = self
            .http
            .post(&token_url)
            .form(&form)
            .send()
            .await
            .context("Failed to reach the token endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Token request failed {}: {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Invalid token response")?;

        Ok(TokenInfo {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}
