//! HTTP provider tests against a mock server

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sop_rag::config::{EmbeddingConfig, LlmBackend, LlmConfig};
use sop_rag::providers::{
    EmbeddingProvider, InferenceRequest, LlmProvider, OllamaEmbedder, OllamaLlm,
    OpenAiCompatibleLlm,
};
use sop_rag::Error;

fn embedding_config(server: &MockServer) -> EmbeddingConfig {
    EmbeddingConfig {
        base_url: server.uri(),
        model: "all-minilm".into(),
        dimensions: 3,
        ..EmbeddingConfig::default()
    }
}

fn hosted(server: &MockServer, timeout: Duration) -> OpenAiCompatibleLlm {
    OpenAiCompatibleLlm::new(
        &format!("{}/openai/v1", server.uri()),
        "test-key".into(),
        "llama-3.3-70b-versatile",
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn test_ollama_embedding_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .and(body_partial_json(json!({ "model": "all-minilm", "prompt": "gowning" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [0.1, 0.2, 0.3] })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&embedding_config(&server)).unwrap();
    let vector = embedder.embed("gowning").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_ollama_batch_keeps_input_order() {
    let server = MockServer::start().await;
    for (text, value) in [("first", 1.0), ("second", 2.0), ("third", 3.0)] {
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(json!({ "prompt": text })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "embedding": [value, 0.0, 0.0] })),
            )
            .mount(&server)
            .await;
    }

    let embedder = OllamaEmbedder::new(&embedding_config(&server)).unwrap();
    let texts = vec!["first".to_string(), "second".to_string(), "third".to_string()];
    let vectors = embedder.embed_batch(&texts).await.unwrap();
    let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
    assert_eq!(firsts, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_ollama_empty_embedding_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embedding": [] })))
        .mount(&server)
        .await;

    let embedder = OllamaEmbedder::new(&embedding_config(&server)).unwrap();
    assert!(matches!(embedder.embed("x").await, Err(Error::Embedding(_))));
}

#[tokio::test]
async fn test_ollama_generate_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "llama3.2:3b",
            "prompt": "Who approves deviations?",
            "stream": false,
            "options": { "temperature": 0.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "The QA manager." })))
        .expect(1)
        .mount(&server)
        .await;

    let config = LlmConfig {
        provider: LlmBackend::Ollama,
        base_url: server.uri(),
        model: "llama3.2:3b".into(),
        ..LlmConfig::default()
    };
    let llm = OllamaLlm::new(&config).unwrap();
    let request = InferenceRequest::new("Who approves deviations?".into(), 0.0);
    assert_eq!(llm.generate(&request).await.unwrap(), "The QA manager.");
}

#[tokio::test]
async fn test_hosted_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "messages": [{ "role": "user", "content": "Grounded prompt" }],
            "temperature": 0.0,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": " Answer text \n" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let llm = hosted(&server, Duration::from_secs(5));
    let request = InferenceRequest::new("Grounded prompt".into(), 0.0);
    assert_eq!(llm.generate(&request).await.unwrap(), " Answer text \n");
}

#[tokio::test]
async fn test_hosted_server_error_carries_request_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .mount(&server)
        .await;

    let llm = hosted(&server, Duration::from_secs(5));
    let request = InferenceRequest::new("q".into(), 0.0);
    match llm.generate(&request).await {
        Err(Error::Inference { request_id, message }) => {
            assert_eq!(request_id, request.request_id);
            assert!(message.contains("500"));
            assert!(message.contains("upstream overloaded"));
        }
        other => panic!("expected inference error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hosted_empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let llm = hosted(&server, Duration::from_secs(5));
    let request = InferenceRequest::new("q".into(), 0.0);
    assert!(matches!(
        llm.generate(&request).await,
        Err(Error::Inference { .. })
    ));
}

#[tokio::test]
async fn test_hosted_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(3))
                .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
        )
        .mount(&server)
        .await;

    let llm = hosted(&server, Duration::from_millis(300));
    let request = InferenceRequest::new("q".into(), 0.0);
    match llm.generate(&request).await {
        Err(Error::InferenceTimeout { request_id, after_ms }) => {
            assert_eq!(request_id, request.request_id);
            assert_eq!(after_ms, 300);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}
