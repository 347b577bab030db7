//! Configuration for the question-answering pipeline

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Knowledge base (document directory) configuration
    pub knowledge: KnowledgeConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Inference endpoint configuration
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Check invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than 0"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::config("embeddings.batch_size must be greater than 0"));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be greater than 0"));
        }
        if self.embeddings.timeout_secs == 0
            || self.retrieval.search_timeout_secs == 0
            || self.llm.timeout_secs == 0
        {
            return Err(Error::config("timeouts must be greater than 0 seconds"));
        }
        Ok(())
    }
}

/// Knowledge base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Directory holding the source documents
    pub directory: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("knowledge"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub model: String,
    /// Expected embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
    /// Number of chunks embedded per batch
    pub batch_size: usize,
    /// Deadline for a single embedding call in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            batch_size: 32,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
    /// Deadline for a nearest-neighbor lookup in seconds
    pub search_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6, // better cross-document coverage
            search_timeout_secs: 10,
        }
    }
}

impl RetrievalConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }
}

/// Inference backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// Hosted endpoint speaking the OpenAI chat completions protocol (Groq by default)
    #[default]
    OpenaiCompatible,
    /// Local Ollama server
    Ollama,
}

/// Inference endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend protocol
    pub provider: LlmBackend,
    /// Endpoint base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,
    /// Inference deadline in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::OpenaiCompatible,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::config(format!(
                "API key not found; set the {} environment variable",
                self.api_key_env
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.provider, LlmBackend::OpenaiCompatible);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            [retrieval]
            top_k = 3

            [llm]
            provider = "ollama"
            model = "llama3.2:3b"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.search_timeout_secs, 10);
        assert_eq!(config.llm.provider, LlmBackend::Ollama);
        assert_eq!(config.llm.model, "llama3.2:3b");
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = RagConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.knowledge.directory, PathBuf::from("knowledge"));
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = LlmConfig {
            api_key_env: "SOP_RAG_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(config.api_key(), Err(Error::Config(_))));
    }
}
