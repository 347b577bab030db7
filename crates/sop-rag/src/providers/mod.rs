//! Provider abstractions for embeddings and answer generation
//!
//! Both external services sit behind traits so the pipeline can run
//! against Ollama, a hosted OpenAI-compatible endpoint, or test fakes.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use crate::config::{LlmBackend, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use llm::{InferenceRequest, LlmProvider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use openai::OpenAiCompatibleLlm;

/// Build the embedding provider described by the config
pub fn embedder_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(OllamaEmbedder::new(&config.embeddings)?))
}

/// Build the LLM provider described by the config
pub fn llm_from_config(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.provider {
        LlmBackend::OpenaiCompatible => Arc::new(OpenAiCompatibleLlm::from_config(&config.llm)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
    };
    Ok(llm)
}
