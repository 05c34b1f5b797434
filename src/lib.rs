// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod auth;
pub mod comments;
pub mod config;
pub mod fetch;
pub mod harvest;
pub mod listing;
pub mod relevance;
pub mod report;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::fetch::{FetchOutcome, FetcherCfg, RateLimitedFetcher, Transport};
pub use crate::harvest::HarvestParams;
pub use crate::relevance::{RelevanceFilter, Vocabulary};
pub use crate::types::{MatchedRow, RawItem};
