// src/config.rs
//! CLI / environment configuration surface. Everything here is glue: the
//! flags map one-to-one onto the pipeline parameter structs.

use crate::auth::Credentials;
use crate::fetch::FetcherCfg;
use crate::harvest::HarvestParams;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SOURCES: [&str; 4] = ["AlexandriaVA", "nova", "ArlingtonVA", "washingtondc"];

/// Scan Reddit /new listings for local incident chatter and write a scored
/// CSV report.
#[derive(Debug, Parser)]
#[command(name = "alx-harvest", version, about)]
pub struct Cli {
    /// Subreddits to scan, in order.
    #[arg(long = "subs", value_delimiter = ',', num_args = 1.., default_values_t = DEFAULT_SOURCES.map(String::from))]
    pub subs: Vec<String>,

    /// Time window: only items newer than this many hours are kept.
    #[arg(long, default_value_t = 48)]
    pub hours: i64,

    /// Per-source item cap.
    #[arg(long = "max-per-sub", default_value_t = 300)]
    pub max_per_sub: usize,

    /// Append top-level comment text before matching and scoring.
    #[arg(long)]
    pub include_comments: bool,

    /// Per-request timeout for listing pages, in seconds.
    #[arg(long, default_value_t = 12)]
    pub request_timeout: u64,

    /// Max top-level comments fetched per item.
    #[arg(long, default_value_t = 20)]
    pub comments_limit: usize,

    /// Per-request timeout for comment pages, in seconds.
    #[arg(long, default_value_t = 12)]
    pub comments_timeout: u64,

    /// Base inter-request delay in milliseconds, jittered to 70-130%.
    #[arg(long, default_value_t = 600)]
    pub sleep_ms: u64,

    /// Ceiling on 429 retries per call; unbounded when omitted.
    #[arg(long = "max-rate-retries")]
    pub max_rate_limit_retries: Option<u32>,

    /// Debug-level pipeline logging.
    #[arg(long)]
    pub verbose: bool,

    /// OAuth client id; public endpoints are used when absent.
    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long, env = "REDDIT_USER_AGENT", default_value = "alexandria-eas/1.3")]
    pub user_agent: String,

    /// Vocabulary TOML overriding the builtin Alexandria set.
    #[arg(long)]
    pub vocabulary: Option<PathBuf>,

    /// Output CSV path.
    #[arg(long, default_value = "data/alx_reddit.csv")]
    pub out: PathBuf,
}

impl Cli {
    /// Credentials only when both halves are present and non-empty; the
    /// authenticated/unauthenticated mode split keys off this.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some(Credentials {
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn fetcher_cfg(&self) -> FetcherCfg {
        FetcherCfg {
            sleep_ms: self.sleep_ms,
            max_rate_limit_retries: self.max_rate_limit_retries,
        }
    }

    pub fn harvest_params(&self) -> HarvestParams {
        HarvestParams {
            sources: self.subs.clone(),
            hours: self.hours,
            max_per_source: self.max_per_sub,
            include_comments: self.include_comments,
            request_timeout: Duration::from_secs(self.request_timeout),
            comments_limit: self.comments_limit,
            comments_timeout: Duration::from_secs(self.comments_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let cli = Cli::parse_from(["alx-harvest"]);
        assert_eq!(cli.subs, DEFAULT_SOURCES.map(String::from));
        assert_eq!(cli.hours, 48);
        assert_eq!(cli.max_per_sub, 300);
        assert!(!cli.include_comments);
        assert_eq!(cli.sleep_ms, 600);
        assert_eq!(cli.comments_limit, 20);
        assert!(cli.max_rate_limit_retries.is_none());
        assert_eq!(cli.out, PathBuf::from("data/alx_reddit.csv"));
    }

    #[test]
    fn subs_accept_comma_separated_values() {
        let cli = Cli::parse_from(["alx-harvest", "--subs", "a,b", "--subs", "c"]);
        assert_eq!(cli.subs, ["a", "b", "c"]);
    }

    #[test]
    fn credentials_require_both_halves() {
        let mut cli = Cli::parse_from(["alx-harvest"]);
        cli.client_id = Some("abc".into());
        cli.client_secret = None;
        assert!(cli.credentials().is_none());
        cli.client_secret = Some(String::new());
        assert!(cli.credentials().is_none());
        cli.client_secret = Some("xyz".into());
        assert!(cli.credentials().is_some());
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let cli = Cli::parse_from(["alx-harvest", "--request-timeout", "5", "--comments-timeout", "7"]);
        let params = cli.harvest_params();
        assert_eq!(params.request_timeout, Duration::from_secs(5));
        assert_eq!(params.comments_timeout, Duration::from_secs(7));
    }
}
