// src/relevance.rs
//! Relevance gate: vocabulary config, keyword matching, high-priority
//! patterns, and urgency scoring.
//!
//! The vocabulary is plain data handed to [`RelevanceFilter::new`], so runs
//! (and tests) can swap term sets without touching global state.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Builtin Alexandria, VA vocabulary, shipped with the binary.
const BUILTIN_VOCABULARY: &str = include_str!("../config/vocabulary.toml");

/// At most this many keyword hits count toward the score.
const KEYWORD_SCORE_CAP: usize = 10;

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct Vocabulary {
    /// Place name granted the whole-word +3 bonus.
    pub primary_place: String,
    /// Incident-type terms, matched as case-insensitive substrings.
    pub keywords: Vec<String>,
    /// Place-name anchors, matched exactly like keywords.
    #[serde(default)]
    pub place_anchors: Vec<String>,
    /// Severe-incident regexes (compiled case-insensitively); any match
    /// flips the high-priority flag.
    #[serde(default)]
    pub high_priority_patterns: Vec<String>,
}

impl Vocabulary {
    /// The compiled-in default vocabulary.
    pub fn builtin() -> Self {
        toml::from_str(BUILTIN_VOCABULARY).expect("builtin vocabulary toml")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing vocabulary toml")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading vocabulary from {}", path.display()))?;
        Self::from_toml_str(&content)
    }
}

/* ----------------------------
Compiled filter
---------------------------- */

/// Holds the lowercased term table and compiled regexes for one run.
#[derive(Debug)]
pub struct RelevanceFilter {
    /// (display casing, lowercase form), sorted by display casing.
    terms: Vec<(String, String)>,
    high_priority: Vec<Regex>,
    primary_place: Regex,
}

impl RelevanceFilter {
    pub fn new(vocab: &Vocabulary) -> Result<Self> {
        let mut terms: Vec<(String, String)> = vocab
            .keywords
            .iter()
            .chain(vocab.place_anchors.iter())
            .map(|t| (t.clone(), t.to_lowercase()))
            .collect();
        terms.sort();
        terms.dedup();

        let high_priority = vocab
            .high_priority_patterns
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){p}"))
                    .map_err(|e| anyhow::anyhow!("high-priority pattern `{}`: {}", p, e))
            })
            .collect::<Result<Vec<_>>>()?;

        let primary_place = Regex::new(&format!(
            r"(?i)\b{}\b",
            regex::escape(&vocab.primary_place)
        ))
        .with_context(|| format!("primary place `{}`", vocab.primary_place))?;

        Ok(Self {
            terms,
            high_priority,
            primary_place,
        })
    }

    /// Vocabulary terms contained in `text` (case-insensitive substring
    /// test). Returned sorted and deduplicated, in vocabulary casing.
    pub fn matched_keywords(&self, text: &str) -> Vec<String> {
        let low = text.to_lowercase();
        self.terms
            .iter()
            .filter(|(_, l)| low.contains(l.as_str()))
            .map(|(display, _)| display.clone())
            .collect()
    }

    /// Entry condition for the result set: at least one term matched.
    pub fn matches(&self, text: &str) -> bool {
        let low = text.to_lowercase();
        self.terms.iter().any(|(_, l)| low.contains(l.as_str()))
    }

    /// True iff any severe-incident pattern matches.
    pub fn is_high_priority(&self, text: &str) -> bool {
        self.high_priority.iter().any(|re| re.is_match(text))
    }

    /// Heuristic urgency score over title+body and engagement counters.
    ///
    /// `min(10, |matched|)·1.5 + upvotes·0.2 + comments·0.1`, plus +10 when
    /// high-priority and +3 when the primary place appears as a whole word.
    /// Rounded to two decimals. A ranking signal, not a probability.
    pub fn score(&self, title: &str, body: &str, upvotes: i64, num_comments: i64) -> f64 {
        let text = format!("{title}\n{body}");
        let hits = self.matched_keywords(&text).len().min(KEYWORD_SCORE_CAP);
        let mut s = hits as f64 * 1.5;
        s += upvotes as f64 * 0.2 + num_comments as f64 * 0.1;
        if self.is_high_priority(&text) {
            s += 10.0;
        }
        if self.primary_place.is_match(&text) {
            s += 3.0;
        }
        (s * 100.0).round() / 100.0
    }
}
