//! LLM provider trait for the remote inference endpoint

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// A single prompt sent to the inference endpoint
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Request ID, echoed in any error
    pub request_id: Uuid,
    /// Full prompt text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl InferenceRequest {
    pub fn new(prompt: String, temperature: f32) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            prompt,
            temperature,
            max_tokens: None,
        }
    }
}

/// Trait for prompt completion
///
/// Implementations report failures as `Error::Inference` or
/// `Error::InferenceTimeout` carrying the request's ID. They never retry.
///
/// Implementations:
/// - `OpenAiCompatibleLlm`: Groq or any `/chat/completions` endpoint
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the prompt and return the generated text unmodified
    async fn generate(&self, request: &InferenceRequest) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
