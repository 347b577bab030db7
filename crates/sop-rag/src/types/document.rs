//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Document formats, keyed by file extension
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
    /// Read as plain text
    Markdown,
    /// Anything else; ignored by ingestion
    Unknown,
}

impl FileType {
    /// Case-insensitive, so `.PDF` counts
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }
}

/// A document read from the knowledge directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Identifier used in context blocks and citations (the file name)
    pub id: String,
    /// Path the document was read from
    pub path: PathBuf,
    /// Extracted text
    pub text: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the extracted text
    pub content_hash: String,
    /// Total number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document
    pub fn new(
        id: String,
        path: PathBuf,
        text: String,
        file_type: FileType,
        total_pages: Option<u32>,
    ) -> Self {
        Self {
            content_hash: hash_content(&text),
            id,
            path,
            text,
            file_type,
            total_pages,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Number of characters in the extracted text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A contiguous slice of a document's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Identifier of the document this chunk came from
    pub document_id: String,
    /// Text content
    pub content: String,
    /// Character offset range in the document text
    pub char_start: usize,
    pub char_end: usize,
    /// Chunk index within document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        document_id: String,
        content: String,
        char_start: usize,
        char_end: usize,
        chunk_index: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            content,
            char_start,
            char_end,
            chunk_index,
        }
    }
}

fn hash_content(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection_ignores_case() {
        assert_eq!(FileType::from_filename("SOP-12.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.Md"), FileType::Markdown);
        assert_eq!(FileType::from_filename("archive.tar.gz"), FileType::Unknown);
        assert_eq!(FileType::from_filename("README"), FileType::Unknown);
    }

    #[test]
    fn test_document_hash_is_stable() {
        let a = Document::new("a.txt".into(), "a.txt".into(), "same".into(), FileType::Txt, None);
        let b = Document::new("b.txt".into(), "b.txt".into(), "same".into(), FileType::Txt, None);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
    }
}
