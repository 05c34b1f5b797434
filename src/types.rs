// src/types.rs
//! Core records shared across the harvest pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One forum post as retrieved from a listing page. Immutable once fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub id: String,
    /// Seconds since epoch, UTC. Reddit serves this as a float.
    pub created_utc: f64,
    pub subreddit: String,
    pub author: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub num_comments: i64,
}

/// A report row derived from a `RawItem` that passed the relevance filter.
/// Created once by the orchestrator, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRow {
    pub id: String,
    pub created_utc: f64,
    pub created_iso: String,
    pub subreddit: String,
    pub author: String,
    pub title: String,
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub num_comments: i64,
    /// Number of comment bodies actually fetched for this item (0 when
    /// comment augmentation is disabled).
    pub comments_scanned: usize,
    /// Sorted, semicolon-joined vocabulary terms that matched.
    pub matched_keywords: String,
    pub high_priority: bool,
    pub eas_score: f64,
}

/// RFC 3339 rendering of a unix-seconds timestamp; empty string for 0/invalid.
pub fn to_iso(ts: f64) -> String {
    if ts <= 0.0 {
        return String::new();
    }
    let secs = ts.trunc() as i64;
    let nsecs = (ts.fract() * 1e9).round() as u32;
    DateTime::<Utc>::from_timestamp(secs, nsecs)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
