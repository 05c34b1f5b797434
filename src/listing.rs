// src/listing.rs
//! Pagination over a source's /new listing with a time-window cutoff.

use crate::fetch::RateLimitedFetcher;
use crate::types::RawItem;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Fixed listing page size.
const PAGE_SIZE: u32 = 100;

/* ----------------------------
Wire shapes (listing envelope)
---------------------------- */

#[derive(Debug, Default, Deserialize)]
struct ListingEnvelope {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingChild {
    #[serde(default)]
    data: PostData,
}

/// Post record as served; any field may be absent or null.
#[derive(Debug, Default, Deserialize)]
struct PostData {
    id: Option<String>,
    created_utc: Option<f64>,
    subreddit: Option<String>,
    author: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    url: Option<String>,
    permalink: Option<String>,
    score: Option<i64>,
    num_comments: Option<i64>,
}

impl PostData {
    fn into_item(self) -> RawItem {
        RawItem {
            id: self.id.unwrap_or_default(),
            created_utc: self.created_utc.unwrap_or(0.0),
            subreddit: self.subreddit.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            selftext: self.selftext.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            permalink: self.permalink.unwrap_or_default(),
            score: self.score.unwrap_or(0),
            num_comments: self.num_comments.unwrap_or(0),
        }
    }
}

/// Walks one source's newest-first listing until the time cutoff, the item
/// cap, or page exhaustion.
pub struct PageWalker<'a> {
    fetcher: &'a RateLimitedFetcher,
    timeout: Duration,
}

impl<'a> PageWalker<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    /// Newest-first items for `source`, length <= `cap`. Pagination stops
    /// the instant an item older than `cutoff` appears (the feed is assumed
    /// time-ordered), on an empty page, or when the cursor runs out. A
    /// failed page fetch ends the walk with whatever was accumulated.
    pub async fn list_new(&self, source: &str, cutoff: f64, cap: usize) -> Vec<RawItem> {
        let url = format!("{}/r/{}/new.json", self.fetcher.base_url(), source);
        let mut out = Vec::new();
        let mut after: Option<String> = None;
        let mut page = 0u32;
        while out.len() < cap {
            page += 1;
            let mut query = vec![("limit".to_string(), PAGE_SIZE.to_string())];
            if let Some(cursor) = &after {
                query.push(("after".to_string(), cursor.clone()));
            }
            let label = format!("{source} page={page}");
            let Some(value) = self
                .fetcher
                .fetch(&url, &query, self.timeout, &label)
                .await
                .into_value()
            else {
                break;
            };
            let envelope: ListingEnvelope = match serde_json::from_value(value) {
                Ok(env) => env,
                Err(e) => {
                    debug!(target: "listing", source, error = %e, "unexpected listing shape");
                    break;
                }
            };
            debug!(target: "listing", source, page, got = envelope.data.children.len(), "page fetched");
            if envelope.data.children.is_empty() {
                break;
            }
            for child in envelope.data.children {
                let item = child.data.into_item();
                if item.created_utc < cutoff {
                    debug!(target: "listing", source, "reached item older than window; stopping");
                    return out;
                }
                out.push(item);
                if out.len() >= cap {
                    return out;
                }
            }
            match envelope.data.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }
        out
    }
}
