//! Scoring, filtering and ranking of workers and jobs.
//!
//! `query` → `retrieval` (embedding + similarity lookup, or attribute
//! `filters` on fallback) → `scoring` → `ranking`.

pub mod filters;
pub mod query;
pub mod ranking;
pub mod retrieval;
pub mod scoring;
pub mod skills;
pub mod weights;

pub use filters::{RawFilters, SearchFilters};
pub use query::SearchQuery;
pub use ranking::{rank, ScoredCandidate};
pub use retrieval::{MatchEngine, MatchEngineConfig, RetrievalPath, SearchOutcome};
pub use scoring::{ComponentScore, MatchScore, MatchScorer, ScoringConfig};
pub use weights::{Weights, DEFAULT_WEIGHTS};
