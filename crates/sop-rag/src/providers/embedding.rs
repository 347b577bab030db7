//! Text-to-vector providers used by the index

use async_trait::async_trait;
use crate::error::Result;

/// Turns text into a fixed-length vector
///
/// Implementations must be deterministic for identical input within one
/// process run; the index relies on it for query/build consistency.
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm, nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order. Calls `embed` one text at a time
    /// unless the provider overrides it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Expected embedding dimensions (384 for all-minilm)
    fn dimensions(&self) -> usize;

    /// Model identifier; recorded in the index to detect mismatched queries
    fn model(&self) -> &str;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Short name used in log lines
    fn name(&self) -> &str;
}
