//! Hugging Face Inference API provider.
//!
//! - POST `{endpoint}` with `{"inputs": "<text>"}` and a bearer token
//! - Response: a flat `[f32; 384]`, or a nested array for token-level output
//!   (mean pooled here)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{EmbeddingError, EmbeddingProvider, EmbeddingResult};

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub dimension: usize,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
}

pub struct HuggingFaceEmbeddingProvider {
    client: Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceEmbeddingProvider {
    pub fn new(config: HuggingFaceConfig) -> EmbeddingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| EmbeddingError::Config(format!("HTTP client error: {e}")))?;

        Ok(Self { client, config })
    }

    fn parse_embedding(&self, body: Value) -> EmbeddingResult<Vec<f32>> {
        let Value::Array(items) = body else {
            return Err(EmbeddingError::Format("response is not an array".into()));
        };

        let token_level = matches!(items.first(), Some(Value::Array(_)));
        let vector = if token_level {
            let rows = items
                .iter()
                .map(as_float_row)
                .collect::<EmbeddingResult<Vec<_>>>()?;
            mean_pool(&rows)?
        } else {
            as_float_row(&Value::Array(items))?
        };

        if vector.len() != self.config.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

fn as_float_row(value: &Value) -> EmbeddingResult<Vec<f32>> {
    let Value::Array(items) = value else {
        return Err(EmbeddingError::Format("expected an array of numbers".into()));
    };

    items
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| EmbeddingError::Format(format!("non-numeric component: {item}")))
        })
        .collect()
}

fn mean_pool(rows: &[Vec<f32>]) -> EmbeddingResult<Vec<f32>> {
    let Some(first) = rows.first() else {
        return Err(EmbeddingError::Format("empty token matrix".into()));
    };

    let width = first.len();
    let mut pooled = vec![0.0f32; width];
    for row in rows {
        if row.len() != width {
            return Err(EmbeddingError::Format("ragged token matrix".into()));
        }
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
    }

    let count = rows.len() as f32;
    for v in &mut pooled {
        *v /= count;
    }
    Ok(pooled)
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddingProvider {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&FeatureExtractionRequest { inputs: text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Request("request timed out".into())
                } else {
                    EmbeddingError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Format(format!("invalid JSON: {e}")))?;

        let vector = self.parse_embedding(body)?;
        debug!(dimension = vector.len(), "embedding received");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer, dimension: usize) -> HuggingFaceConfig {
        HuggingFaceConfig {
            endpoint: format!("{}/pipeline/feature-extraction/minilm", server.uri()),
            api_key: "hf_test".into(),
            timeout_secs: 5,
            dimension,
        }
    }

    #[tokio::test]
    async fn returns_flat_embedding() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/pipeline/feature-extraction/minilm"))
            .and(header("Authorization", "Bearer hf_test"))
            .and(body_json(serde_json::json!({ "inputs": "urgent plumber" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![0.25f32; 4]))
            .mount(&server)
            .await;

        let provider = HuggingFaceEmbeddingProvider::new(test_config(&server, 4)).unwrap();
        let embedding = provider.embed("urgent plumber").await.unwrap();

        assert_eq!(embedding, vec![0.25; 4]);
    }

    #[tokio::test]
    async fn mean_pools_token_level_output() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([[1.0, 0.0], [0.0, 1.0]])),
            )
            .mount(&server)
            .await;

        let provider = HuggingFaceEmbeddingProvider::new(test_config(&server, 2)).unwrap();
        let embedding = provider.embed("mason").await.unwrap();

        assert_eq!(embedding, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let provider = HuggingFaceEmbeddingProvider::new(test_config(&server, 4)).unwrap();
        let result = provider.embed("painter").await;

        assert!(matches!(result, Err(EmbeddingError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn rejects_non_array_and_wrong_dimension() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({ "inputs": "object" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "x" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({ "inputs": "short" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![0.1f32; 3]))
            .mount(&server)
            .await;

        let provider = HuggingFaceEmbeddingProvider::new(test_config(&server, 4)).unwrap();

        assert!(matches!(
            provider.embed("object").await,
            Err(EmbeddingError::Format(_))
        ));
        assert!(matches!(
            provider.embed("short").await,
            Err(EmbeddingError::DimensionMismatch { expected: 4, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_a_request() {
        let server = MockServer::start().await;
        let provider = HuggingFaceEmbeddingProvider::new(test_config(&server, 4)).unwrap();

        assert!(matches!(
            provider.embed("   ").await,
            Err(EmbeddingError::EmptyInput)
        ));
    }
}
