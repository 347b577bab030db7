//! sop-rag: grounded question answering over a folder of SOP documents
//!
//! Documents (PDF, plain text, Markdown) are read from a knowledge
//! directory, split into overlapping chunks, embedded and held in an
//! in-memory similarity index. Questions retrieve the closest chunks,
//! which are sent with the question to a remote inference endpoint that
//! is instructed to answer only from that context.
//!
//! ```no_run
//! # async fn run() -> sop_rag::Result<()> {
//! use sop_rag::{providers, Assistant, RagConfig};
//!
//! let config = RagConfig::default();
//! let embedder = providers::embedder_from_config(&config)?;
//! let llm = providers::llm_from_config(&config)?;
//!
//! let mut assistant = Assistant::new(config, embedder, llm);
//! assistant.load_knowledge().await?;
//! let record = assistant.ask("Who approves a deviation report?").await?;
//! println!("{}\nSources consulted: {}", record.answer, record.sources.join(", "));
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use assistant::{Assistant, AuditEntry, AuditTrail, KnowledgeStatus};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::Answerer;
pub use ingestion::{IngestReport, Ingestor};
pub use retrieval::{IndexHandle, Indexer};
pub use types::{AnswerRecord, Chunk, Document, FileType, QueryResult, ScoredChunk};
