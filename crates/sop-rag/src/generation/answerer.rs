//! Answer generation against the inference endpoint

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{InferenceRequest, LlmProvider};
use crate::types::{AnswerRecord, QueryResult};

use super::prompt::PromptBuilder;

/// Turns retrieved chunks and a question into a grounded answer
pub struct Answerer {
    llm: Arc<dyn LlmProvider>,
    deadline: Duration,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Answerer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            deadline: config.timeout(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Override the inference deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Ask the inference endpoint once; the response text is returned as-is
    ///
    /// Failures are not retried. On error no record is produced.
    pub async fn answer(&self, question: &str, result: &QueryResult<'_>) -> Result<AnswerRecord> {
        let context = PromptBuilder::build_context(result);
        let prompt = PromptBuilder::build_grounded_prompt(question, &context);

        let mut request = InferenceRequest::new(prompt, self.temperature);
        request.max_tokens = self.max_tokens;
        let request_id = request.request_id;

        tracing::info!(
            "Request {}: generating answer with {} ({}) from {} chunks",
            request_id,
            self.llm.name(),
            self.llm.model(),
            result.len()
        );

        let start = Instant::now();
        let answer = match tokio::time::timeout(self.deadline, self.llm.generate(&request)).await {
            Err(_) => {
                tracing::warn!("Request {} exceeded {:?}", request_id, self.deadline);
                return Err(Error::InferenceTimeout {
                    request_id,
                    after_ms: self.deadline.as_millis() as u64,
                });
            }
            Ok(Err(e @ (Error::Inference { .. } | Error::InferenceTimeout { .. }))) => {
                return Err(e)
            }
            Ok(Err(other)) => return Err(Error::inference(request_id, other.to_string())),
            Ok(Ok(text)) => text,
        };
        let processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!("Request {} answered in {}ms", request_id, processing_time_ms);

        Ok(AnswerRecord {
            request_id,
            question: question.to_string(),
            context,
            answer,
            sources: result.sources(),
            model: self.llm.model().to_string(),
            processing_time_ms,
            answered_at: chrono::Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ScoredChunk};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records the prompt and replies with a fixed answer
    struct EchoLlm {
        reply: String,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn generate(&self, request: &InferenceRequest) -> Result<String> {
            self.seen.lock().push(request.prompt.clone());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate(&self, _request: &InferenceRequest) -> Result<String> {
            Err(Error::config("backend misconfigured"))
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn model(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn test_answer_is_returned_verbatim() {
        let llm = Arc::new(EchoLlm {
            reply: "  Gloves are required. [sop.pdf]\n".into(),
            seen: Mutex::new(Vec::new()),
        });
        let answerer = Answerer::new(llm.clone(), &LlmConfig::default());

        let chunk = Chunk::new("sop.pdf".into(), "Sterile gloves are required.".into(), 0, 28, 0);
        let result = QueryResult::new(vec![ScoredChunk { chunk: &chunk, similarity: 0.9 }]);

        let record = answerer.answer("Are gloves required?", &result).await.unwrap();
        assert_eq!(record.answer, "  Gloves are required. [sop.pdf]\n");
        assert_eq!(record.sources, vec!["sop.pdf".to_string()]);
        assert!(record.context.contains("Source: sop.pdf"));
        assert_eq!(record.model, "echo-1");

        let prompts = llm.seen.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Are gloves required?"));
    }

    #[tokio::test]
    async fn test_other_errors_become_inference_errors() {
        let answerer = Answerer::new(Arc::new(FailingLlm), &LlmConfig::default());
        let err = answerer.answer("q", &QueryResult::default()).await.unwrap_err();
        match err {
            Error::Inference { message, .. } => assert!(message.contains("misconfigured")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
