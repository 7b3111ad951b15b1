//! Read-only access to worker and job records.
//!
//! Profile CRUD happens elsewhere; the matching side only ever loads
//! snapshots through [`CandidateStore`].

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Job, Worker};

pub use memory::MemoryCandidateStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("failed to map candidate row: {0}")]
    Mapping(String),
}

#[async_trait]
pub trait CandidateStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn workers(&self) -> Result<Vec<Worker>, StoreError>;

    /// Open jobs only.
    async fn jobs(&self) -> Result<Vec<Job>, StoreError>;

    async fn job(&self, id: &str) -> Result<Option<Job>, StoreError>;

    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;
}
