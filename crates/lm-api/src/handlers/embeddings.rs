use axum::{extract::State, Json};
use lm_common::embedding::NullEmbeddingProvider;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::warn;

use crate::error::ApiError;
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
    pub provider: &'static str,
    pub dimension: usize,
}

/// Embed profile or job text for storage alongside the record.
///
/// A failing or slow provider yields the deterministic mock vector so that
/// profile saves never block on the model host.
pub async fn create_embedding(
    State(state): State<SharedState>,
    Json(request): Json<EmbeddingRequest>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("text is required".into()));
    }

    let provider = state.engine.embedding_provider();
    let limit = state.engine.config().provider_timeout;

    let embedded = match timeout(limit, provider.embed(text)).await {
        Ok(Ok(vector)) => Some(vector),
        Ok(Err(err)) => {
            warn!(
                provider = provider.name(),
                error = %err,
                "embedding failed; returning mock vector"
            );
            None
        }
        Err(_) => {
            warn!(
                provider = provider.name(),
                "embedding timed out; returning mock vector"
            );
            None
        }
    };

    let response = match embedded {
        Some(embedding) => EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            provider: provider.name(),
        },
        None => {
            let null = NullEmbeddingProvider::with_dimension(provider.dimension());
            let embedding = null.mock_vector(text);
            EmbeddingResponse {
                dimension: embedding.len(),
                embedding,
                provider: "null",
            }
        }
    };

    Ok(Json(response))
}
