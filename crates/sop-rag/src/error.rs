//! Error types for the question-answering pipeline

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// A document could not be read or parsed (recovered by skipping during ingestion)
    #[error("Unreadable document '{document}': {message}")]
    UnreadableDocument { document: String, message: String },

    /// Embedding generation failed; aborts the build or query that triggered it
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// The query side does not match the index it is run against
    #[error("Index mismatch: index built with {expected}, query produced {actual}")]
    IndexMismatch { expected: String, actual: String },

    /// No index was built, or it holds zero chunks
    #[error("Index is empty; build it from at least one chunk before querying")]
    EmptyIndex,

    /// The inference endpoint did not answer within the deadline
    #[error("Inference request {request_id} timed out after {after_ms}ms")]
    InferenceTimeout { request_id: Uuid, after_ms: u64 },

    /// The inference endpoint reported a failure
    #[error("Inference request {request_id} failed: {message}")]
    Inference { request_id: Uuid, message: String },

    /// Similarity store error
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config error
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an unreadable document error
    pub fn unreadable(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnreadableDocument {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an inference error for a request
    pub fn inference(request_id: Uuid, message: impl Into<String>) -> Self {
        Self::Inference {
            request_id,
            message: message.into(),
        }
    }

    /// Create a vector store error
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error only affects a single document and ingestion may continue
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnreadableDocument { .. })
    }
}
