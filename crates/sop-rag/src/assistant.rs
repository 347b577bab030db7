//! Question-answering session over a knowledge directory
//!
//! Composes ingestion, indexing and answering, and keeps an audit trail
//! of every question asked during the session.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::Answerer;
use crate::ingestion::{IngestReport, Ingestor, ReaderRegistry, SkippedDocument, TextChunker};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{IndexHandle, Indexer};
use crate::types::AnswerRecord;

/// A question as it was received
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub asked_at: chrono::DateTime<chrono::Utc>,
    pub question: String,
}

/// Append-only, in-memory log of questions for this process
#[derive(Debug, Default)]
pub struct AuditTrail {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditTrail {
    pub fn record(&self, question: &str) {
        tracing::info!("Question received: {}", question);
        self.entries.lock().push(AuditEntry {
            asked_at: chrono::Utc::now(),
            question: question.to_string(),
        });
    }

    /// Snapshot of every entry, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// What the knowledge base currently holds
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeStatus {
    pub directory: PathBuf,
    /// Supported files present in the directory
    pub files: Vec<String>,
    /// Documents read successfully
    pub documents: Vec<String>,
    pub chunks: usize,
    pub skipped: Vec<SkippedDocument>,
    /// Whether an index has been built
    pub indexed: bool,
}

impl KnowledgeStatus {
    /// Read and chunk the knowledge directory without embedding anything
    ///
    /// Needs neither the embedding service nor inference credentials.
    pub async fn scan(config: &RagConfig) -> Result<Self> {
        let dir = &config.knowledge.directory;
        ensure_directory(dir).await?;

        let ingestor = Ingestor::new(
            ReaderRegistry::default(),
            TextChunker::from_config(&config.chunking),
        );
        let files = file_names(&ingestor, dir).await?;
        let report = ingestor.ingest(dir).await?;

        Ok(Self {
            directory: dir.clone(),
            files,
            documents: report.documents.iter().map(|d| d.id.clone()).collect(),
            chunks: report.chunks.len(),
            skipped: report.skipped,
            indexed: false,
        })
    }
}

async fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.exists() {
        tracing::info!("Creating knowledge directory {}", dir.display());
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

async fn file_names(ingestor: &Ingestor, dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    Ok(ingestor
        .list_documents(dir)
        .await?
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect())
}

pub struct Assistant {
    config: RagConfig,
    ingestor: Ingestor,
    indexer: Indexer,
    answerer: Answerer,
    index: Option<IndexHandle>,
    last_report: Option<IngestReport>,
    audit: AuditTrail,
}

impl Assistant {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let ingestor = Ingestor::new(
            ReaderRegistry::default(),
            TextChunker::from_config(&config.chunking),
        );
        let indexer = Indexer::new(embedder, &config);
        let answerer = Answerer::new(llm, &config.llm);

        Self {
            config,
            ingestor,
            indexer,
            answerer,
            index: None,
            last_report: None,
            audit: AuditTrail::default(),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// The current index, if one has been built
    pub fn index(&self) -> Option<&IndexHandle> {
        self.index.as_ref()
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// Ingest the knowledge directory and rebuild the index
    ///
    /// The directory is created when missing. On failure the previous
    /// index (if any) stays in place.
    pub async fn load_knowledge(&mut self) -> Result<KnowledgeStatus> {
        let start = Instant::now();
        let dir = self.config.knowledge.directory.clone();
        ensure_directory(&dir).await?;

        let mut report = self.ingestor.ingest(&dir).await?;
        let chunks = std::mem::take(&mut report.chunks);
        let handle = self.indexer.build(chunks).await?;

        tracing::info!(
            "Knowledge base loaded: {} documents, {} chunks in {}ms",
            report.documents.len(),
            handle.len(),
            start.elapsed().as_millis()
        );

        self.index = Some(handle);
        self.last_report = Some(report);
        self.knowledge_status().await
    }

    pub async fn knowledge_status(&self) -> Result<KnowledgeStatus> {
        let dir = &self.config.knowledge.directory;
        let files = file_names(&self.ingestor, dir).await?;

        let (documents, skipped) = match &self.last_report {
            Some(report) => (
                report.documents.iter().map(|d| d.id.clone()).collect(),
                report.skipped.clone(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Ok(KnowledgeStatus {
            directory: dir.clone(),
            files,
            documents,
            chunks: self.index.as_ref().map_or(0, IndexHandle::len),
            skipped,
            indexed: self.index.is_some(),
        })
    }

    /// Answer a question from the indexed documents
    pub async fn ask(&self, question: &str) -> Result<AnswerRecord> {
        if question.trim().is_empty() {
            return Err(Error::config("question must not be empty"));
        }
        self.audit.record(question);

        let handle = self.index.as_ref().ok_or(Error::EmptyIndex)?;
        let result = self
            .indexer
            .query(handle, question, self.config.retrieval.top_k)
            .await?;
        self.answerer.answer(question, &result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_trail_keeps_order() {
        let trail = AuditTrail::default();
        assert!(trail.is_empty());
        trail.record("first?");
        trail.record("second?");

        let entries = trail.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].question, "first?");
        assert_eq!(entries[1].question, "second?");
        assert!(entries[0].asked_at <= entries[1].asked_at);
    }
}
