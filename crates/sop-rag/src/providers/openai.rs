//! Client for hosted endpoints speaking the OpenAI chat completions protocol
//!
//! Defaults target Groq (`llama-3.3-70b-versatile`), but any compatible
//! `/chat/completions` endpoint works.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{InferenceRequest, LlmProvider};

/// OpenAI-compatible chat completions client
pub struct OpenAiCompatibleLlm {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleLlm {
    /// Build from config, reading the API key from the configured env var
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(&config.base_url, config.api_key()?, &config.model, config.timeout())
    }

    pub fn new(base_url: &str, api_key: String, model: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            timeout,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_error(&self, request: &InferenceRequest, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::InferenceTimeout {
                request_id: request.request_id,
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::inference(request.request_id, format!("request failed: {}", e))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleLlm {
    async fn generate(&self, request: &InferenceRequest) -> Result<String> {
        let payload = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        tracing::debug!(
            "Sending request {} to {} ({})",
            request.request_id,
            self.completions_url(),
            self.model
        );

        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.request_error(request, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::inference(
                request.request_id,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| self.request_error(request, e))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::inference(request.request_id, "response contained no choices"))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        match self.http.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
