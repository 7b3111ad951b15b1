use async_trait::async_trait;
use tokio_postgres::Row;
use tracing::instrument;

use super::util::{parse_vector_literal, TimedClientExt};
use super::PgPool;
use crate::store::{CandidateStore, StoreError};
use crate::{Job, Worker};

const WORKERS_SQL: &str = "\
    SELECT wp.user_id::text AS id,\
        p.name AS name,\
        wp.skills AS skills,\
        wp.wage_expectation::float8 AS wage_expectation,\
        wp.location AS location,\
        p.rating::float8 AS rating,\
        wp.embedding::text AS embedding \
    FROM worker_profiles wp \
    JOIN profiles p ON p.id = wp.user_id";

const JOB_COLUMNS: &str = "\
    SELECT j.id::text AS id,\
        j.title AS title,\
        j.description AS description,\
        j.skill AS skill,\
        j.skill_tags AS skill_tags,\
        j.wage::float8 AS wage,\
        COALESCE(j.location_text, j.location) AS location,\
        COALESCE(j.urgency, false) AS urgent,\
        p.rating::float8 AS rating,\
        j.embedding::text AS embedding \
    FROM jobs j \
    LEFT JOIN profiles p ON p.id = j.employer_id";

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T, StoreError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Mapping(format!("{name}: {e}")))
}

fn embedding_column(row: &Row) -> Result<Option<Vec<f32>>, StoreError> {
    let raw: Option<String> = column(row, "embedding")?;
    Ok(raw.as_deref().and_then(parse_vector_literal))
}

fn worker_from_row(row: &Row) -> Result<Worker, StoreError> {
    Ok(Worker {
        id: column(row, "id")?,
        name: column(row, "name")?,
        skills: column::<Option<Vec<String>>>(row, "skills")?.unwrap_or_default(),
        wage_expectation: column(row, "wage_expectation")?,
        location: column(row, "location")?,
        rating: column(row, "rating")?,
        embedding: embedding_column(row)?,
    })
}

fn job_from_row(row: &Row) -> Result<Job, StoreError> {
    Ok(Job {
        id: column(row, "id")?,
        title: column(row, "title")?,
        description: column(row, "description")?,
        skill: column(row, "skill")?,
        skill_tags: column::<Option<Vec<String>>>(row, "skill_tags")?.unwrap_or_default(),
        wage: column(row, "wage")?,
        location: column(row, "location")?,
        urgent: column(row, "urgent")?,
        rating: column(row, "rating")?,
        embedding: embedding_column(row)?,
    })
}

/// Candidate snapshots read from the marketplace tables
/// (`worker_profiles` ⨝ `profiles`, `jobs`).
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self))]
    async fn workers(&self) -> Result<Vec<Worker>, StoreError> {
        let client = self.pool.get().await?;
        let rows = client
            .timed_query_cached(WORKERS_SQL, &[], "load_workers")
            .await?;
        rows.iter().map(worker_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn jobs(&self) -> Result<Vec<Job>, StoreError> {
        let client = self.pool.get().await?;
        let sql = format!("{JOB_COLUMNS} WHERE j.status = 'open'");
        let rows = client.timed_query_cached(&sql, &[], "load_open_jobs").await?;
        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let client = self.pool.get().await?;
        let sql = format!("{JOB_COLUMNS} WHERE j.id::text = $1");
        let row = client
            .timed_query_opt_cached(&sql, &[&id], "load_job")
            .await?;
        row.as_ref().map(job_from_row).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}
