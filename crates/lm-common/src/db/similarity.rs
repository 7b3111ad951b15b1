use async_trait::async_trait;
use tracing::instrument;

use super::util::{to_vector_literal, TimedClientExt};
use super::PgPool;
use crate::index::{IndexError, SimilarityHit, SimilarityIndex};
use crate::CandidateKind;

/// A database function of the shape
/// `fn(query_embedding vector, match_threshold float, match_count int)
///  returns table(<id_column> uuid, similarity float)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTarget {
    pub function: String,
    pub id_column: String,
}

impl RpcTarget {
    pub fn new(function: &str, id_column: &str) -> Result<Self, IndexError> {
        for name in [function, id_column] {
            if !is_identifier(name) {
                return Err(IndexError::Unavailable(format!(
                    "invalid identifier for similarity rpc: {name:?}"
                )));
            }
        }

        Ok(Self {
            function: function.to_string(),
            id_column: id_column.to_string(),
        })
    }

    fn sql(&self) -> String {
        format!(
            "SELECT {id}::text AS candidate_id, similarity::float8 AS similarity \
             FROM {function}($1::text::vector, $2::float8, $3::int)",
            id = self.id_column,
            function = self.function,
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Similarity lookup delegated to pgvector functions in the database.
#[derive(Clone)]
pub struct PgSimilarityIndex {
    pool: PgPool,
    workers: RpcTarget,
    jobs: RpcTarget,
}

impl PgSimilarityIndex {
    /// Uses `match_workers(worker_id, …)` and `match_jobs(job_id, …)`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            workers: RpcTarget {
                function: "match_workers".into(),
                id_column: "worker_id".into(),
            },
            jobs: RpcTarget {
                function: "match_jobs".into(),
                id_column: "job_id".into(),
            },
        }
    }

    pub fn with_targets(pool: PgPool, workers: RpcTarget, jobs: RpcTarget) -> Self {
        Self {
            pool,
            workers,
            jobs,
        }
    }

    fn target(&self, kind: CandidateKind) -> &RpcTarget {
        match kind {
            CandidateKind::Worker => &self.workers,
            CandidateKind::Job => &self.jobs,
        }
    }
}

#[async_trait]
impl SimilarityIndex for PgSimilarityIndex {
    fn name(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self, vector), fields(dimension = vector.len()))]
    async fn similarity_search(
        &self,
        kind: CandidateKind,
        vector: &[f32],
        threshold: f32,
        count: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError> {
        let target = self.target(kind);
        let literal = to_vector_literal(vector);
        let threshold = f64::from(threshold);
        let count = i32::try_from(count).unwrap_or(i32::MAX);

        let client = self.pool.get().await?;
        let rows = client
            .timed_query_cached(
                &target.sql(),
                &[&literal, &threshold, &count],
                &target.function,
            )
            .await?;

        let hits = rows
            .iter()
            .map(|row| {
                let candidate_id: String = row.try_get("candidate_id")?;
                let similarity: f64 = row.try_get("similarity")?;
                Ok(SimilarityHit {
                    candidate_id,
                    similarity: similarity as f32,
                })
            })
            .collect::<Result<Vec<_>, tokio_postgres::Error>>()?;

        // pgvector yields NaN for zero vectors, and NaN passes `>` in SQL.
        Ok(hits
            .into_iter()
            .filter(|hit| hit.similarity.is_finite())
            .collect())
    }
}
