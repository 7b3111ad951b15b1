use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use serde::Serialize;
use strum::AsRefStr;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::{
    filters::SearchFilters,
    query::SearchQuery,
    ranking::{rank, ScoredCandidate},
    scoring::{MatchScore, MatchScorer, ScoringConfig},
};
use crate::{
    config::{EngineSettings, MAX_RESULT_LIMIT},
    embedding::EmbeddingProvider,
    index::{SimilarityHit, SimilarityIndex},
    run_id, Candidate, CandidateKind, Job, MatchProfile, Worker,
};

#[derive(Clone)]
pub struct MatchEngineConfig {
    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub similarity_index: Arc<dyn SimilarityIndex>,
    /// Similarity a hit must exceed; searches with no hit above it fall back
    /// to attribute filters.
    pub fallback_threshold: f32,
    pub result_limit: usize,
    pub similarity_count: usize,
    pub provider_timeout: Duration,
    pub similarity_weight: f64,
    pub notify_threshold: f32,
    pub notify_count: usize,
    pub scoring: ScoringConfig,
}

impl MatchEngineConfig {
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        similarity_index: Arc<dyn SimilarityIndex>,
    ) -> Self {
        Self::from_settings(
            &EngineSettings::default(),
            embedding_provider,
            similarity_index,
        )
    }

    pub fn from_settings(
        settings: &EngineSettings,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        similarity_index: Arc<dyn SimilarityIndex>,
    ) -> Self {
        Self {
            embedding_provider,
            similarity_index,
            fallback_threshold: settings.similarity_threshold,
            result_limit: settings.result_limit,
            similarity_count: settings.similarity_count,
            provider_timeout: settings.provider_timeout,
            similarity_weight: settings.similarity_weight,
            notify_threshold: settings.notify_threshold,
            notify_count: settings.notify_count,
            scoring: ScoringConfig::default(),
        }
    }
}

/// How the candidates of a search were selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RetrievalPath {
    /// Similarity index hits, re-scored.
    Semantic,
    /// Attribute filters over the whole snapshot, scored.
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub search_id: String,
    pub path: RetrievalPath,
    pub results: Vec<ScoredCandidate>,
}

/// Semantic retrieval with attribute-filter fallback, followed by rule
/// scoring and ranking.
///
/// Provider and index failures are logged and end in the fallback path;
/// nothing here returns an error to the caller.
pub struct MatchEngine {
    config: MatchEngineConfig,
    scorer: MatchScorer,
}

impl MatchEngine {
    pub fn new(config: MatchEngineConfig) -> Self {
        let scorer = MatchScorer::new(config.scoring.clone());
        Self { config, scorer }
    }

    pub fn config(&self) -> &MatchEngineConfig {
        &self.config
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.config.embedding_provider
    }

    /// `None` and `Some(0)` both mean the configured default.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.config.result_limit)
            .clamp(1, MAX_RESULT_LIMIT)
    }

    pub fn score(&self, query: &SearchQuery, candidate: &Candidate) -> MatchScore {
        self.scorer.score(query, candidate)
    }

    /// Rank `kind` records of `candidates` for `query`.
    #[instrument(skip_all, fields(kind = kind.as_ref(), search_id = tracing::field::Empty))]
    pub async fn search(
        &self,
        kind: CandidateKind,
        candidates: &[Candidate],
        query: &SearchQuery,
        filters: &SearchFilters,
        limit: Option<usize>,
    ) -> SearchOutcome {
        let search_id = run_id::generate();
        tracing::Span::current().record("search_id", search_id.as_str());
        let limit = self.effective_limit(limit);

        let pool: Vec<&Candidate> = candidates.iter().filter(|c| c.kind() == kind).collect();

        let semantic = match self.query_embedding(query).await {
            Some(vector) => {
                let hits = self
                    .similar(
                        kind,
                        &vector,
                        self.config.fallback_threshold,
                        self.config.similarity_count,
                    )
                    .await;
                resolve_hits(&pool, hits)
            }
            None => Vec::new(),
        };

        let (path, selected) = if semantic.is_empty() {
            let fallback = filters.with_default_text(query.search_text());
            let selected: Vec<_> = pool
                .into_iter()
                .filter(|c| fallback.matches(*c))
                .map(|c| (c, None))
                .collect();
            (RetrievalPath::Fallback, selected)
        } else {
            let selected: Vec<_> = semantic
                .into_iter()
                .filter(|(c, _)| filters.matches_numeric(*c))
                .map(|(c, similarity)| (c, Some(similarity)))
                .collect();
            (RetrievalPath::Semantic, selected)
        };

        let scored = selected
            .into_iter()
            .map(|(candidate, similarity)| {
                let breakdown = self.scorer.score(query, candidate);
                ScoredCandidate::new(
                    candidate.clone(),
                    breakdown,
                    similarity,
                    self.config.similarity_weight,
                )
            })
            .collect();

        let results = rank(scored, limit);
        info!(
            path = path.as_ref(),
            results = results.len(),
            limit,
            "search completed"
        );

        SearchOutcome {
            search_id,
            path,
            results,
        }
    }

    /// Workers to notify about a newly posted job.
    ///
    /// Uses the job's stored vector with the broad notification threshold;
    /// without a vector, or with no hit, falls back to workers whose location
    /// contains the job location.
    #[instrument(skip_all, fields(job_id = %job.id))]
    pub async fn notification_targets(&self, job: &Job, workers: &[Worker]) -> Vec<String> {
        let count = self.config.notify_count.max(1);

        if let Some(vector) = job.embedding.as_deref().filter(|v| !v.is_empty()) {
            let known: HashSet<&str> = workers.iter().map(|w| w.id.as_str()).collect();
            let mut seen = HashSet::new();
            let ids: Vec<String> = self
                .similar(
                    CandidateKind::Worker,
                    vector,
                    self.config.notify_threshold,
                    count,
                )
                .await
                .into_iter()
                .filter(|hit| known.contains(hit.candidate_id.as_str()))
                .filter(|hit| seen.insert(hit.candidate_id.clone()))
                .map(|hit| hit.candidate_id)
                .take(count)
                .collect();

            if !ids.is_empty() {
                info!(targets = ids.len(), "notification targets from similarity");
                return ids;
            }
        }

        let Some(location) = job
            .location
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
        else {
            debug!("job has neither vector hits nor location");
            return Vec::new();
        };

        let ids: Vec<String> = workers
            .iter()
            .filter(|w| {
                w.location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&location))
            })
            .map(|w| w.id.clone())
            .take(count)
            .collect();

        info!(targets = ids.len(), "notification targets from location");
        ids
    }

    async fn query_embedding(&self, query: &SearchQuery) -> Option<Vec<f32>> {
        if let Some(vector) = query.embedding.as_ref().filter(|v| !v.is_empty()) {
            return Some(vector.clone());
        }

        let text = query.embedding_text();
        if text.is_empty() {
            return None;
        }

        let provider = &self.config.embedding_provider;
        match timeout(self.config.provider_timeout, provider.embed(&text)).await {
            Ok(Ok(vector)) => Some(vector),
            Ok(Err(err)) => {
                warn!(
                    provider = provider.name(),
                    error = %err,
                    "embedding failed; using attribute filters"
                );
                None
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    timeout_ms = self.config.provider_timeout.as_millis() as u64,
                    "embedding timed out; using attribute filters"
                );
                None
            }
        }
    }

    async fn similar(
        &self,
        kind: CandidateKind,
        vector: &[f32],
        threshold: f32,
        count: usize,
    ) -> Vec<SimilarityHit> {
        let index = &self.config.similarity_index;
        let lookup = index.similarity_search(kind, vector, threshold, count);

        match timeout(self.config.provider_timeout, lookup).await {
            Ok(Ok(hits)) => {
                debug!(index = index.name(), hits = hits.len(), "similarity lookup");
                hits
            }
            Ok(Err(err)) => {
                warn!(index = index.name(), error = %err, "similarity lookup failed");
                Vec::new()
            }
            Err(_) => {
                warn!(index = index.name(), "similarity lookup timed out");
                Vec::new()
            }
        }
    }
}

/// Map index hits back onto the snapshot, keeping hit order. Ids missing from
/// the snapshot, repeated ids and non-finite similarities are dropped.
fn resolve_hits<'a>(
    pool: &[&'a Candidate],
    hits: Vec<SimilarityHit>,
) -> Vec<(&'a Candidate, f32)> {
    let by_id: HashMap<&'a str, &'a Candidate> =
        pool.iter().copied().map(|c| (c.id(), c)).collect();
    let mut seen = HashSet::new();

    hits.into_iter()
        .filter(|hit| hit.similarity.is_finite())
        .filter_map(|hit| {
            let candidate = by_id.get(hit.candidate_id.as_str())?;
            seen.insert(hit.candidate_id)
                .then_some((*candidate, hit.similarity))
        })
        .collect()
}
