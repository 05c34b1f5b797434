// src/comments.rs
//! Bounded retrieval of an item's direct replies.

use crate::fetch::RateLimitedFetcher;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Outcome of a comment fetch. `Unavailable` covers failed calls and
/// unexpected payload shapes; callers treat both as "no comments".
#[derive(Debug, PartialEq)]
pub enum CommentBatch {
    Fetched(Vec<String>),
    Unavailable,
}

impl CommentBatch {
    pub fn into_bodies(self) -> Vec<String> {
        match self {
            Self::Fetched(bodies) => bodies,
            Self::Unavailable => Vec::new(),
        }
    }
}

/* ----------------------------
Wire shapes (comment listing)
---------------------------- */

#[derive(Debug, Default, Deserialize)]
struct CommentListing {
    #[serde(default)]
    data: CommentListingData,
}

#[derive(Debug, Default, Deserialize)]
struct CommentListingData {
    #[serde(default)]
    children: Vec<CommentChild>,
}

#[derive(Debug, Default, Deserialize)]
struct CommentChild {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    data: CommentData,
}

#[derive(Debug, Default, Deserialize)]
struct CommentData {
    body: Option<String>,
}

/// Fetches one page of top-level replies, newest first, depth 1.
pub struct CommentFetcher<'a> {
    fetcher: &'a RateLimitedFetcher,
    timeout: Duration,
    limit: usize,
}

impl<'a> CommentFetcher<'a> {
    pub fn new(fetcher: &'a RateLimitedFetcher, timeout: Duration, limit: usize) -> Self {
        Self {
            fetcher,
            timeout,
            limit,
        }
    }

    /// At most `limit` non-empty comment bodies for one item.
    pub async fn list_comments(&self, source: &str, item_id: &str) -> CommentBatch {
        let url = format!(
            "{}/r/{}/comments/{}.json",
            self.fetcher.base_url(),
            source,
            item_id
        );
        let query = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("depth".to_string(), "1".to_string()),
            ("sort".to_string(), "new".to_string()),
        ];
        let label = format!("comments {source}/{item_id}");
        let Some(value) = self
            .fetcher
            .fetch(&url, &query, self.timeout, &label)
            .await
            .into_value()
        else {
            return CommentBatch::Unavailable;
        };
        parse_comment_bodies(value, self.limit)
    }
}

/// The comments endpoint answers with a two-element array whose second
/// element lists the replies. Anything else is an unexpected shape.
fn parse_comment_bodies(value: serde_json::Value, limit: usize) -> CommentBatch {
    let serde_json::Value::Array(parts) = value else {
        return CommentBatch::Unavailable;
    };
    if parts.len() < 2 {
        return CommentBatch::Unavailable;
    }
    let Some(second) = parts.into_iter().nth(1) else {
        return CommentBatch::Unavailable;
    };
    let listing: CommentListing = match serde_json::from_value(second) {
        Ok(listing) => listing,
        Err(e) => {
            debug!(target: "comments", error = %e, "unexpected comments shape");
            return CommentBatch::Unavailable;
        }
    };
    let mut out = Vec::new();
    for child in listing.data.children {
        // Only direct comment records; listings may interleave "more" stubs.
        if child.kind != "t1" {
            continue;
        }
        let Some(body) = child.data.body else {
            continue;
        };
        if body.is_empty() {
            continue;
        }
        out.push(body);
        if out.len() >= limit {
            break;
        }
    }
    CommentBatch::Fetched(out)
}
