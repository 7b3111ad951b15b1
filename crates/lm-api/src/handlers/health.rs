use std::sync::atomic::Ordering;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use serde_json::json;
use tokio::time::{timeout, Duration};

use crate::error::ApiError;
use crate::SharedState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn livez() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn readyz(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.readiness.load(Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    timeout(READINESS_TIMEOUT, state.store.ping())
        .await
        .map_err(|_| ApiError::ServiceUnavailable("store_ping_timeout".into()))
        .and_then(|result| {
            result.map_err(|err| ApiError::ServiceUnavailable(format!("store check failed: {err}")))
        })?;

    Ok(Json(json!({
        "status": "ok",
        "store": state.store.name(),
        "embedder": state.engine.embedding_provider().name(),
        "application": env!("CARGO_PKG_NAME"),
    })))
}

pub async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = lm_metrics::render()
        .ok_or_else(|| ApiError::NotFound("metrics are disabled".into()))?;

    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
