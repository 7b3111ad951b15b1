//! Vector similarity lookup.
//!
//! The production index lives in the database (`match_workers` RPC, see
//! [`crate::db::similarity`]); [`InMemorySimilarityIndex`] serves tests and
//! store-less deployments.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CandidateKind;

pub use memory::InMemorySimilarityIndex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub candidate_id: String,
    pub similarity: f32,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("similarity index unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    fn name(&self) -> &'static str;

    /// Nearest neighbours of `vector` among records of `kind`, most similar
    /// first, keeping only hits with similarity above `threshold`.
    async fn similarity_search(
        &self,
        kind: CandidateKind,
        vector: &[f32],
        threshold: f32,
        count: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError>;
}
