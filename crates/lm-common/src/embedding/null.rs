use async_trait::async_trait;

use super::{EmbeddingProvider, EmbeddingResult, EMBEDDING_DIMENSION};

/// Stand-in provider for environments without embedding credentials.
///
/// Produces `sin(char_count + i) * 0.1` per component: the same text always
/// maps to the same vector, so the pipeline stays runnable and tests stay
/// deterministic. The similarities it yields carry no meaning.
#[derive(Debug, Clone)]
pub struct NullEmbeddingProvider {
    dimension: usize,
}

impl NullEmbeddingProvider {
    pub fn new() -> Self {
        Self::with_dimension(EMBEDDING_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn mock_vector(&self, text: &str) -> Vec<f32> {
        let len = text.chars().count();
        (0..self.dimension)
            .map(|i| ((len + i) as f32).sin() * 0.1)
            .collect()
    }
}

impl Default for NullEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    fn name(&self) -> &'static str {
        "null"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        Ok(self.mock_vector(text))
    }
}
