use axum::{extract::State, Json};
use lm_common::matching::{RawFilters, SearchFilters, SearchOutcome, SearchQuery};
use lm_common::{Candidate, CandidateKind};
use serde::Deserialize;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: SearchQuery,
    /// Form values; unparseable numbers are ignored.
    #[serde(default)]
    pub filters: RawFilters,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn search_workers(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let candidates: Vec<Candidate> = state
        .store
        .workers()
        .await?
        .into_iter()
        .map(Candidate::from)
        .collect();

    run_search(&state, CandidateKind::Worker, &candidates, request).await
}

pub async fn search_jobs(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let candidates: Vec<Candidate> = state
        .store
        .jobs()
        .await?
        .into_iter()
        .map(Candidate::from)
        .collect();

    run_search(&state, CandidateKind::Job, &candidates, request).await
}

async fn run_search(
    state: &SharedState,
    kind: CandidateKind,
    candidates: &[Candidate],
    request: SearchRequest,
) -> Result<Json<SearchOutcome>, ApiError> {
    let filters = SearchFilters::from_raw(&request.filters);
    let outcome = state
        .engine
        .search(kind, candidates, &request.query, &filters, request.limit)
        .await;

    lm_metrics::record_search(kind.as_ref(), outcome.path.as_ref(), outcome.results.len());
    Ok(Json(outcome))
}
