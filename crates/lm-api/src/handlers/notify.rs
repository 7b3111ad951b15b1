use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct MatchWorkersResponse {
    pub job_id: String,
    pub worker_ids: Vec<String>,
}

/// Workers to notify about job `id`. Delivery is left to the caller.
pub async fn match_workers(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
) -> Result<Json<MatchWorkersResponse>, ApiError> {
    let job = state
        .store
        .job(&job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))?;

    let workers = state.store.workers().await?;
    let worker_ids = state.engine.notification_targets(&job, &workers).await;
    lm_metrics::record_notification_targets(worker_ids.len());

    Ok(Json(MatchWorkersResponse { job_id, worker_ids }))
}
