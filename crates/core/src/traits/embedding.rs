//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Text-to-vector collaborator
///
/// Implementations:
/// - `HttpEmbedder` - Ollama-compatible embedding endpoint
/// - `HashingEmbedder` - deterministic offline fallback
///
/// Contract: `embed` returns a unit vector of `dimension()` length and
/// the same input yields the same output within a run. Calls may block
/// on I/O; failures surface as `Error::EmbeddingUnavailable`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + 'static {
    /// Encode one text into a unit vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode several texts; callers batch where possible but must
    /// tolerate single-item calls
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Fixed output dimension
    fn dimension(&self) -> usize;

    /// Health probe; false when the backend is unreachable
    async fn is_available(&self) -> bool {
        true
    }
}

/// Normalize a vector to unit length in place; zero vectors are left as-is
pub fn normalize_in_place(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity between two unit vectors
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
