use axum::{extract::State, Json};
use lm_common::matching::{MatchScore, SearchQuery};
use lm_common::Candidate;
use serde::Deserialize;

use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub query: SearchQuery,
    pub candidate: Candidate,
}

/// Rule score for one query/candidate pair, without retrieval.
pub async fn score_candidate(
    State(state): State<SharedState>,
    Json(request): Json<ScoreRequest>,
) -> Json<MatchScore> {
    Json(state.engine.score(&request.query, &request.candidate))
}
