// src/auth.rs
//! Request-header provider with lazy OAuth client-credentials refresh.
//!
//! A failed exchange downgrades to unauthenticated mode instead of failing
//! the run; the downgrade is an explicit [`TokenOutcome`] variant so callers
//! can tell it apart from "no credentials configured".

use crate::fetch::Transport;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const OAUTH_BASE_URL: &str = "https://oauth.reddit.com";
const PUBLIC_BASE_URL: &str = "https://www.reddit.com";
/// Refresh this many seconds before the declared expiry.
const EXPIRY_SLACK_SECS: i64 = 30;
const TOKEN_TIMEOUT: Duration = Duration::from_secs(12);
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Result of a token lookup. Neither variant is fatal: `Unauthenticated`
/// just means the authorization header is omitted.
#[derive(Debug, PartialEq)]
pub enum TokenOutcome {
    Bearer(String),
    Unauthenticated,
}

#[derive(Debug, Clone)]
struct AuthToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Owns the token lifecycle. The cache sits behind a mutex so a concurrent
/// orchestrator could not race duplicate exchanges; the current pipeline is
/// strictly sequential.
pub struct AuthProvider {
    creds: Option<Credentials>,
    user_agent: String,
    transport: Arc<dyn Transport>,
    token: Mutex<Option<AuthToken>>,
}

impl AuthProvider {
    pub fn new(
        creds: Option<Credentials>,
        user_agent: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            creds,
            user_agent: user_agent.into(),
            transport,
            token: Mutex::new(None),
        }
    }

    /// Pure function of credential presence, decided once per run.
    pub fn base_url(&self) -> &'static str {
        if self.creds.is_some() {
            OAUTH_BASE_URL
        } else {
            PUBLIC_BASE_URL
        }
    }

    /// Headers for one request: always the user agent, plus a bearer token
    /// when credentials are present and a token could be obtained.
    pub async fn headers(&self) -> Vec<(String, String)> {
        let mut h = vec![("User-Agent".to_string(), self.user_agent.clone())];
        if let Some(creds) = &self.creds {
            if let TokenOutcome::Bearer(tok) = self.ensure_token(creds).await {
                h.push(("Authorization".to_string(), format!("Bearer {tok}")));
            }
        }
        h
    }

    /// Reuse the cached token until shortly before expiry, otherwise exchange
    /// client credentials. Any failure clears the cache and downgrades.
    async fn ensure_token(&self, creds: &Credentials) -> TokenOutcome {
        let mut slot = self.token.lock().await;
        let now = chrono::Utc::now().timestamp();
        if let Some(tok) = slot.as_ref() {
            if now < tok.expires_at - EXPIRY_SLACK_SECS {
                return TokenOutcome::Bearer(tok.access_token.clone());
            }
        }
        match self.exchange(creds).await {
            Ok(tok) => {
                let access = tok.access_token.clone();
                *slot = Some(tok);
                TokenOutcome::Bearer(access)
            }
            Err(e) => {
                warn!(target: "auth", error = %e, "token exchange failed; continuing unauthenticated");
                *slot = None;
                TokenOutcome::Unauthenticated
            }
        }
    }

    async fn exchange(&self, creds: &Credentials) -> Result<AuthToken> {
        debug!(target: "auth", "requesting access token");
        let form = [(
            "grant_type".to_string(),
            "client_credentials".to_string(),
        )];
        let headers = [("User-Agent".to_string(), self.user_agent.clone())];
        let resp = self
            .transport
            .post_form(
                TOKEN_URL,
                &form,
                (&creds.client_id, &creds.client_secret),
                &headers,
                TOKEN_TIMEOUT,
            )
            .await?;
        if !resp.is_success() {
            anyhow::bail!("token endpoint returned status {}", resp.status);
        }
        let parsed: TokenResponse =
            serde_json::from_str(&resp.body).context("parsing token response")?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Ok(AuthToken {
            access_token: parsed.access_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in,
        })
    }
}
