// src/harvest.rs
//! The per-source harvest loop: walk listings, optionally augment with
//! comment text, filter, score, and sort.

use crate::comments::CommentFetcher;
use crate::fetch::RateLimitedFetcher;
use crate::listing::PageWalker;
use crate::relevance::RelevanceFilter;
use crate::types::{to_iso, MatchedRow, RawItem};
use chrono::Utc;
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct HarvestParams {
    /// Scanned in the supplied order; duplicates permitted but wasteful.
    pub sources: Vec<String>,
    pub hours: i64,
    pub max_per_source: usize,
    pub include_comments: bool,
    pub request_timeout: Duration,
    pub comments_limit: usize,
    pub comments_timeout: Duration,
}

/// Drives the whole run. A failure fetching one source's listing or one
/// item's comments yields fewer rows; nothing aborts the run.
pub async fn harvest(
    fetcher: &RateLimitedFetcher,
    filter: &RelevanceFilter,
    params: &HarvestParams,
) -> Vec<MatchedRow> {
    let cutoff = (Utc::now() - chrono::Duration::hours(params.hours)).timestamp() as f64;
    harvest_since(fetcher, filter, params, cutoff).await
}

/// Same as [`harvest`] with an explicit cutoff; the split keeps scenario
/// tests deterministic.
pub async fn harvest_since(
    fetcher: &RateLimitedFetcher,
    filter: &RelevanceFilter,
    params: &HarvestParams,
    cutoff: f64,
) -> Vec<MatchedRow> {
    let walker = PageWalker::new(fetcher, params.request_timeout);
    let commenter = CommentFetcher::new(fetcher, params.comments_timeout, params.comments_limit);
    let mut rows: Vec<MatchedRow> = Vec::new();
    let mut scanned = 0usize;
    info!(
        target: "harvest",
        sources = ?params.sources,
        hours = params.hours,
        max_per_source = params.max_per_source,
        include_comments = params.include_comments,
        "starting harvest"
    );
    for source in &params.sources {
        let items = walker.list_new(source, cutoff, params.max_per_source).await;
        debug!(target: "harvest", %source, fetched = items.len(), "listing walked");
        let before = rows.len();
        for item in items {
            scanned += 1;
            if let Some(row) =
                evaluate_item(filter, &commenter, source, item, params.include_comments).await
            {
                rows.push(row);
            }
        }
        info!(
            target: "harvest",
            %source,
            matched_here = rows.len() - before,
            total_matched = rows.len(),
            "source done"
        );
    }
    // Stable sort: score descending, then creation time descending; exact
    // ties keep encounter order.
    rows.sort_by(|a, b| {
        b.eas_score
            .partial_cmp(&a.eas_score)
            .unwrap_or(Ordering::Equal)
            .then(
                b.created_utc
                    .partial_cmp(&a.created_utc)
                    .unwrap_or(Ordering::Equal),
            )
    });
    info!(target: "harvest", scanned, matched = rows.len(), "harvest finished");
    rows
}

/// Filter one item, augmenting its body with comment text when enabled.
/// Returns the finished row iff at least one vocabulary term matched.
async fn evaluate_item(
    filter: &RelevanceFilter,
    commenter: &CommentFetcher<'_>,
    source: &str,
    item: RawItem,
    include_comments: bool,
) -> Option<MatchedRow> {
    let mut body = item.selftext.clone();
    let mut comments_scanned = 0usize;
    if include_comments {
        let bodies = commenter.list_comments(source, &item.id).await.into_bodies();
        comments_scanned = bodies.len();
        body = format!("{}\n{}", body, bodies.join("\n")).trim().to_string();
    }

    let combined = format!("{}\n{}", item.title, body);
    let matched = filter.matched_keywords(&combined);
    if matched.is_empty() {
        return None;
    }
    let high_priority = filter.is_high_priority(&combined);
    let eas_score = filter.score(&item.title, &body, item.score, item.num_comments);
    Some(MatchedRow {
        id: item.id,
        created_utc: item.created_utc,
        created_iso: to_iso(item.created_utc),
        subreddit: item.subreddit,
        author: item.author,
        title: item.title,
        selftext: item.selftext,
        url: item.url,
        permalink: format!("https://reddit.com{}", item.permalink),
        score: item.score,
        num_comments: item.num_comments,
        comments_scanned,
        matched_keywords: matched.join(";"),
        high_priority,
        eas_score,
    })
}
