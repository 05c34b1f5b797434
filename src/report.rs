// src/report.rs
//! CSV sink for the sorted result set.

use crate::types::MatchedRow;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Fixed column order consumed by downstream tooling.
const COLUMNS: [&str; 15] = [
    "id",
    "created_utc",
    "created_iso",
    "subreddit",
    "author",
    "title",
    "selftext",
    "url",
    "permalink",
    "score",
    "num_comments",
    "comments_scanned",
    "matched_keywords",
    "high_priority",
    "eas_score",
];

/// Write the report, creating parent directories as needed.
pub fn write_csv(rows: &[MatchedRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(path, render_csv(rows)).with_context(|| format!("writing {}", path.display()))
}

pub fn render_csv(rows: &[MatchedRow]) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(","));
    out.push('\n');
    for row in rows {
        let fields = [
            escape(&row.id),
            row.created_utc.to_string(),
            escape(&row.created_iso),
            escape(&row.subreddit),
            escape(&row.author),
            escape(&row.title),
            escape(&row.selftext),
            escape(&row.url),
            escape(&row.permalink),
            row.score.to_string(),
            row.num_comments.to_string(),
            row.comments_scanned.to_string(),
            escape(&row.matched_keywords),
            row.high_priority.to_string(),
            row.eas_score.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Minimal RFC 4180 quoting: wrap fields carrying a comma, quote, or line
/// break; double any embedded quotes.
fn escape(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
