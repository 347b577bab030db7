//! Directory ingestion: read, parse, chunk

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;
use super::reader::ReaderRegistry;

/// A file that was found but could not be ingested
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkippedDocument {
    /// File name
    pub document: String,
    /// Why it was skipped
    pub reason: String,
}

/// Output of one ingestion run
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Documents read successfully
    pub documents: Vec<Document>,
    /// Chunks from all documents, in document order
    pub chunks: Vec<Chunk>,
    /// Files that failed to parse
    pub skipped: Vec<SkippedDocument>,
}

/// Reads every supported document in a directory and chunks it
#[derive(Clone)]
pub struct Ingestor {
    readers: ReaderRegistry,
    chunker: TextChunker,
}

impl Ingestor {
    pub fn new(readers: ReaderRegistry, chunker: TextChunker) -> Self {
        Self { readers, chunker }
    }

    /// Supported files in `dir`, sorted by file name (non-recursive)
    pub async fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::debug!("Skipping non UTF-8 file name {:?}", path);
                continue;
            };
            if self.readers.supports(name) {
                files.push(path);
            } else {
                tracing::debug!("Ignoring unsupported file {}", name);
            }
        }

        files.sort();
        Ok(files)
    }

    /// Ingest every supported document in `dir`
    ///
    /// Unreadable documents are logged and reported in `skipped`; they
    /// never abort the run. Failing to list the directory does.
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport> {
        let start = Instant::now();
        let files = self.list_documents(dir).await?;
        tracing::info!("Ingesting {} documents from {}", files.len(), dir.display());

        let mut report = IngestReport::default();

        for path in files {
            match self.ingest_file(&path).await {
                Ok(document) => {
                    let chunks = self.chunker.chunk_document(&document);
                    tracing::debug!(
                        "Ingested {} ({} chars, {} chunks)",
                        document.id,
                        document.char_len(),
                        chunks.len()
                    );
                    report.chunks.extend(chunks);
                    report.documents.push(document);
                }
                Err(Error::UnreadableDocument { document, message }) => {
                    tracing::warn!("Could not load {}: {}", document, message);
                    report.skipped.push(SkippedDocument {
                        document,
                        reason: message,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Ingestion complete: {} documents, {} chunks, {} skipped in {}ms",
            report.documents.len(),
            report.chunks.len(),
            report.skipped.len(),
            start.elapsed().as_millis()
        );

        Ok(report)
    }

    /// Read and parse a single file
    async fn ingest_file(&self, path: &Path) -> Result<Document> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::unreadable(&name, format!("read failed: {}", e)))?;

        // PDF parsing is CPU-bound and may block on a worker thread
        let readers = self.readers.clone();
        let parse_name = name.clone();
        let parsed = tokio::task::spawn_blocking(move || readers.read(&parse_name, &data))
            .await
            .map_err(|e| Error::unreadable(&name, format!("parser task failed: {}", e)))??;

        Ok(Document::new(
            name,
            path.to_path_buf(),
            parsed.text,
            parsed.file_type,
            parsed.total_pages,
        ))
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(ReaderRegistry::default(), TextChunker::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_ingest_skips_unreadable_and_ignores_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.txt"), "Bravo procedure text").unwrap();
        fs::write(tmp.path().join("a.md"), "# Alpha\nAlpha procedure text").unwrap();
        fs::write(tmp.path().join("broken.PDF"), "definitely not a pdf").unwrap();
        fs::write(tmp.path().join("photo.png"), [0u8, 1, 2]).unwrap();
        fs::create_dir(tmp.path().join("nested.txt")).unwrap();

        let ingestor = Ingestor::new(ReaderRegistry::default(), TextChunker::new(100, 10));
        let report = ingestor.ingest(tmp.path()).await.unwrap();

        let ids: Vec<&str> = report.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.txt"]);
        assert_eq!(report.chunks.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].document, "broken.PDF");
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Ingestor::default().ingest(&tmp.path().join("missing")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
