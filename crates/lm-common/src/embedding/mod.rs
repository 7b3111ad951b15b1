//! Embedding providers.
//!
//! The engine only sees [`EmbeddingProvider`]. Which implementation backs it is
//! decided once at startup by [`create_embedding_provider`]:
//! - `HuggingFaceEmbeddingProvider`: hosted sentence-transformers model (384 dims)
//! - `HashEmbeddingProvider`: feature hashing, deterministic, no network
//! - `NullEmbeddingProvider`: deterministic mock vector, used when no credentials exist

pub mod hash;
pub mod huggingface;
pub mod null;
pub mod similarity;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

pub use hash::HashEmbeddingProvider;
pub use huggingface::{HuggingFaceConfig, HuggingFaceEmbeddingProvider};
pub use null::NullEmbeddingProvider;
pub use similarity::cosine_similarity;

/// Dimension of all-MiniLM-L6-v2, which the stored worker/job vectors use.
pub const EMBEDDING_DIMENSION: usize = 384;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("embedding provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected embedding format: {0}")]
    Format(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding configuration error: {0}")]
    Config(String),
    #[error("text to embed is empty")]
    EmptyInput,
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Implementation name ("huggingface", "hash", "null"), recorded in logs.
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingProviderSettings {
    /// "huggingface" | "hash" | "null"
    pub kind: String,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingProviderSettings {
    fn default() -> Self {
        Self {
            kind: "huggingface".into(),
            api_key: None,
            endpoint: huggingface::DEFAULT_ENDPOINT.into(),
            timeout_secs: 30,
        }
    }
}

impl EmbeddingProviderSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            kind: std::env::var("LM_EMBEDDER").unwrap_or(defaults.kind),
            api_key: std::env::var("HUGGINGFACE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            endpoint: std::env::var("LM_HF_ENDPOINT").unwrap_or(defaults.endpoint),
            timeout_secs: std::env::var("LM_PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

/// Build the configured provider. Missing credentials or an unknown name
/// select the null provider instead of failing startup.
pub fn create_embedding_provider(settings: &EmbeddingProviderSettings) -> Arc<dyn EmbeddingProvider> {
    match settings.kind.as_str() {
        "huggingface" | "hf" => {
            let Some(api_key) = settings.api_key.clone() else {
                warn!("no HUGGINGFACE_API_KEY configured; using null embedding provider");
                return Arc::new(NullEmbeddingProvider::new());
            };

            let config = HuggingFaceConfig {
                endpoint: settings.endpoint.clone(),
                api_key,
                timeout_secs: settings.timeout_secs,
                dimension: EMBEDDING_DIMENSION,
            };
            match HuggingFaceEmbeddingProvider::new(config) {
                Ok(provider) => {
                    info!(endpoint = %settings.endpoint, "using huggingface embedding provider");
                    Arc::new(provider)
                }
                Err(err) => {
                    warn!(error = %err, "failed to build huggingface client; using null embedding provider");
                    Arc::new(NullEmbeddingProvider::new())
                }
            }
        }
        "hash" => Arc::new(HashEmbeddingProvider::new(EMBEDDING_DIMENSION)),
        "null" => Arc::new(NullEmbeddingProvider::new()),
        other => {
            warn!(embedder = other, "unknown embedder; using null embedding provider");
            Arc::new(NullEmbeddingProvider::new())
        }
    }
}
