use async_trait::async_trait;

use super::{CandidateStore, StoreError};
use crate::{Candidate, Job, Worker};

/// Fixed snapshot of workers and jobs held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCandidateStore {
    workers: Vec<Worker>,
    jobs: Vec<Job>,
}

impl MemoryCandidateStore {
    pub fn new(workers: Vec<Worker>, jobs: Vec<Job>) -> Self {
        Self { workers, jobs }
    }

    /// Every record as a [`Candidate`], workers first.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.workers
            .iter()
            .cloned()
            .map(Candidate::Worker)
            .chain(self.jobs.iter().cloned().map(Candidate::Job))
            .collect()
    }
}

#[async_trait]
impl CandidateStore for MemoryCandidateStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn workers(&self) -> Result<Vec<Worker>, StoreError> {
        Ok(self.workers.clone())
    }

    async fn jobs(&self) -> Result<Vec<Job>, StoreError> {
        Ok(self.jobs.clone())
    }

    async fn job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        Ok(self.jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_jobs_by_id() {
        let store = MemoryCandidateStore::new(
            vec![Worker {
                id: "w1".into(),
                ..Worker::default()
            }],
            vec![Job {
                id: "j1".into(),
                ..Job::default()
            }],
        );

        assert!(store.job("j1").await.unwrap().is_some());
        assert!(store.job("missing").await.unwrap().is_none());
        assert_eq!(store.candidates().len(), 2);
    }
}
