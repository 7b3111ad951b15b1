
use async_trait::async_trait;

use super::{IndexError, SimilarityHit, SimilarityIndex};
use crate::embedding::cosine_similarity;
use crate::{Candidate, CandidateKind, MatchProfile};

#[derive(Debug, Clone)]
struct IndexEntry {
    kind: CandidateKind,
    id: String,
    vector: Vec<f32>,
}

/// Brute-force cosine index over a candidate snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemorySimilarityIndex {
    entries: Vec<IndexEntry>,
}

impl InMemorySimilarityIndex {
    /// Index every candidate that carries an embedding; the rest are skipped.
    pub fn from_candidates<'a>(candidates: impl IntoIterator<Item = &'a Candidate>) -> Self {
        let entries = candidates
            .into_iter()
            .filter_map(|candidate| {
                candidate.embedding().map(|vector| IndexEntry {
                    kind: candidate.kind(),
                    id: candidate.id().to_string(),
                    vector: vector.to_vec(),
                })
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SimilarityIndex for InMemorySimilarityIndex {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn similarity_search(
        &self,
        kind: CandidateKind,
        vector: &[f32],
        threshold: f32,
        count: usize,
    ) -> Result<Vec<SimilarityHit>, IndexError> {
        let mut hits: Vec<SimilarityHit> = self
            .entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| SimilarityHit {
                candidate_id: entry.id.clone(),
                similarity: cosine_similarity(vector, &entry.vector),
            })
            .filter(|hit| hit.similarity.is_finite() && hit.similarity > threshold)
            .collect();

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(count);
        Ok(hits)
    }
}
