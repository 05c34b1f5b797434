// src/fetch.rs
//! The sole network chokepoint: JSON GETs with rate-limit backoff, transient
//! retry, and post-success jitter throttling.

use crate::auth::AuthProvider;
use anyhow::Result;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Abandon a call after this many transient (non-429) failures.
const MAX_TRANSIENT_RETRIES: u32 = 3;
const RATE_LIMIT_BACKOFF_CAP_SECS: u64 = 30;
const TRANSIENT_BACKOFF_CAP_SECS: u64 = 20;

/// Minimal response view; keeps transports scriptable in tests.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Thin HTTP seam so the pipeline can run against scripted responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse>;

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        basic_auth: (&str, &str),
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse>;
}

/// Production transport over a shared reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let mut req = self.client.get(url).timeout(timeout).query(query);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        basic_auth: (&str, &str),
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<HttpResponse> {
        let (user, secret) = basic_auth;
        let mut req = self
            .client
            .post(url)
            .timeout(timeout)
            .basic_auth(user, Some(secret))
            .form(form);
        for (name, value) in headers {
            req = req.header(name, value);
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Outcome of one fetch call. The degraded variants read as "no data" to
/// callers but stay distinguishable in diagnostics.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(serde_json::Value),
    /// More than `MAX_TRANSIENT_RETRIES` non-rate-limit failures.
    Abandoned,
    /// The configured rate-limit retry ceiling was exceeded.
    RateLimited,
}

impl FetchOutcome {
    pub fn into_value(self) -> Option<serde_json::Value> {
        match self {
            Self::Success(v) => Some(v),
            Self::Abandoned | Self::RateLimited => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetcherCfg {
    /// Base inter-request delay in milliseconds; jittered to 70-130% after
    /// each successful response. 0 disables the pause.
    pub sleep_ms: u64,
    /// `None` keeps the original never-give-up behavior on HTTP 429.
    pub max_rate_limit_retries: Option<u32>,
}

impl Default for FetcherCfg {
    fn default() -> Self {
        Self {
            sleep_ms: 0,
            max_rate_limit_retries: None,
        }
    }
}

/// Issues single GETs with two independent retry counters per call: one for
/// rate-limit signals, one for everything else.
pub struct RateLimitedFetcher {
    transport: Arc<dyn Transport>,
    auth: AuthProvider,
    cfg: FetcherCfg,
}

impl RateLimitedFetcher {
    pub fn new(transport: Arc<dyn Transport>, auth: AuthProvider, cfg: FetcherCfg) -> Self {
        Self {
            transport,
            auth,
            cfg,
        }
    }

    /// Host serving listing/comment requests for this run.
    pub fn base_url(&self) -> &'static str {
        self.auth.base_url()
    }

    /// GET `url` and parse the body as JSON, retrying per the backoff rules.
    /// Never returns an error: degraded calls come back as [`FetchOutcome`]
    /// variants the caller treats as empty.
    pub async fn fetch(
        &self,
        url: &str,
        query: &[(String, String)],
        timeout: Duration,
        label: &str,
    ) -> FetchOutcome {
        let mut rate_tries = 0u32;
        let mut fail_tries = 0u32;
        loop {
            debug!(target: "fetch", %label, url, "request");
            let headers = self.auth.headers().await;
            let failure: anyhow::Error = match self.transport.get(url, query, &headers, timeout).await
            {
                Ok(resp) if resp.status == 429 => {
                    rate_tries += 1;
                    if let Some(max) = self.cfg.max_rate_limit_retries {
                        if rate_tries > max {
                            warn!(target: "fetch", %label, tries = rate_tries, "rate limited, giving up");
                            return FetchOutcome::RateLimited;
                        }
                    }
                    let wait = backoff_delay(rate_tries, RATE_LIMIT_BACKOFF_CAP_SECS);
                    warn!(target: "fetch", %label, tries = rate_tries, wait_secs = wait.as_secs(), "rate limited, backing off");
                    sleep(wait).await;
                    continue;
                }
                Ok(resp) if resp.is_success() => match serde_json::from_str(&resp.body) {
                    Ok(value) => {
                        self.jitter_pause().await;
                        return FetchOutcome::Success(value);
                    }
                    // A 2xx body that is not JSON retries like any failure.
                    Err(e) => e.into(),
                },
                Ok(resp) => anyhow::anyhow!("unexpected status {}", resp.status),
                Err(e) => e,
            };
            fail_tries += 1;
            if fail_tries > MAX_TRANSIENT_RETRIES {
                warn!(target: "fetch", %label, error = %failure, "request failed, abandoning");
                return FetchOutcome::Abandoned;
            }
            let wait = backoff_delay(fail_tries, TRANSIENT_BACKOFF_CAP_SECS);
            warn!(target: "fetch", %label, error = %failure, tries = fail_tries, wait_secs = wait.as_secs(), "request failed, retrying");
            sleep(wait).await;
        }
    }

    /// Uniform 70-130% of the configured delay, applied after each success
    /// to keep the steady-state request rate off lock-step timing.
    async fn jitter_pause(&self) {
        if self.cfg.sleep_ms == 0 {
            return;
        }
        let ms = rand::rng().random_range(0.7..=1.3) * self.cfg.sleep_ms as f64;
        sleep(Duration::from_millis(ms as u64)).await;
    }
}

/// `min(cap, 2^tries)` seconds.
fn backoff_delay(tries: u32, cap_secs: u64) -> Duration {
    let pow = 2u64.saturating_pow(tries.min(6));
    Duration::from_secs(pow.min(cap_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_backoff_doubles_then_caps_at_thirty() {
        let waits: Vec<u64> = (1..=6)
            .map(|n| backoff_delay(n, RATE_LIMIT_BACKOFF_CAP_SECS).as_secs())
            .collect();
        assert_eq!(waits, vec![2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn transient_backoff_caps_at_twenty() {
        assert_eq!(
            backoff_delay(5, TRANSIENT_BACKOFF_CAP_SECS),
            Duration::from_secs(20)
        );
        assert_eq!(
            backoff_delay(3, TRANSIENT_BACKOFF_CAP_SECS),
            Duration::from_secs(8)
        );
    }

    #[test]
    fn success_status_range() {
        assert!(HttpResponse {
            status: 204,
            body: String::new()
        }
        .is_success());
        assert!(!HttpResponse {
            status: 429,
            body: String::new()
        }
        .is_success());
    }
}
