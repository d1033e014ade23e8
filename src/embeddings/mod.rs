//! Embedding providers: the external-service boundary, an HTTP client, and
//! a deterministic test double.

pub mod http;

use async_trait::async_trait;

use crate::types::RagError;

pub use http::HttpEmbedder;

/// Boundary to an external embedding service.
///
/// Implementations must return one vector per input text, in input order,
/// all with the same dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a batch of document chunks.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError>;
}

/// Deterministic embedding provider for tests and offline runs.
///
/// Vectors are derived from an FNV-style hash of the input, normalized to
/// unit length, so identical texts always embed identically and different
/// texts (almost always) differ.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dim: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dim: 8 }
    }

    pub fn with_dim(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut state: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in text.bytes() {
            state ^= u64::from(byte);
            state = state.wrapping_mul(0x0000_0100_0000_01b3);
        }

        let mut values = Vec::with_capacity(self.dim);
        for lane in 0..self.dim {
            let mut mixed = state.wrapping_add((lane as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
            mixed ^= mixed >> 33;
            values.push(((mixed % 2000) as f32 / 1000.0) - 1.0);
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }
        values
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        Ok(self.embed(text))
    }
}
