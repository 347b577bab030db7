//! Fixed-size text chunking with overlap and offset tracking

use crate::config::ChunkingConfig;
use crate::types::{Chunk, Document};

/// Text chunker with configurable size and overlap
///
/// Windows are measured in characters and never split a UTF-8 sequence.
/// Boundaries do not try to follow sentences.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` is clamped below `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk a document's text
    ///
    /// Whitespace-only windows are dropped, so any document with visible
    /// text yields at least one chunk.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let text = doc.text.as_str();

        // Byte offset of every char, plus the end of the string
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;
        let mut start = 0usize;

        while start < total_chars {
            let end = (start + self.chunk_size).min(total_chars);
            let content = &text[boundaries[start]..boundaries[end]];

            if !content.trim().is_empty() {
                chunks.push(Chunk::new(
                    doc.id.clone(),
                    content.to_string(),
                    start,
                    end,
                    chunk_index,
                ));
                chunk_index += 1;
            }

            if end == total_chars {
                break;
            }
            start = end - self.overlap;
        }

        tracing::debug!("Chunked {} into {} chunks", doc.id, chunks.len());
        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn doc(text: &str) -> Document {
        Document::new("doc.txt".into(), "doc.txt".into(), text.into(), FileType::Txt, None)
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = TextChunker::new(100, 10).chunk_document(&doc("Short text"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Short text");
        assert_eq!((chunks[0].char_start, chunks[0].char_end), (0, 10));
        assert_eq!(chunks[0].document_id, "doc.txt");
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = TextChunker::new(4, 1).chunk_document(&doc("abcdefghij"));
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["abcd", "defg", "ghij"]);
        assert_eq!(chunks[1].char_start, 3);
        assert_eq!(chunks[2].char_end, 10);
        assert_eq!(chunks[2].chunk_index, 2);
    }

    #[test]
    fn test_offsets_are_char_based() {
        let text = "ééééé€€€€€";
        let d = doc(text);
        let chunks = TextChunker::new(3, 0).chunk_document(&d);
        for chunk in &chunks {
            let expected: String = text
                .chars()
                .skip(chunk.char_start)
                .take(chunk.char_end - chunk.char_start)
                .collect();
            assert_eq!(chunk.content, expected);
        }
        assert_eq!(chunks.last().unwrap().char_end, 10);
    }

    #[test]
    fn test_whitespace_windows_are_skipped() {
        let text = format!("head{}tail", " ".repeat(20));
        let chunks = TextChunker::new(8, 0).chunk_document(&doc(&text));
        assert!(chunks.iter().all(|c| !c.content.trim().is_empty()));
        assert_eq!(chunks.first().unwrap().content.trim(), "head");
        assert_eq!(chunks.last().unwrap().content.trim(), "tail");
    }

    #[test]
    fn test_overlap_is_clamped() {
        // Overlap >= size would never advance
        let chunks = TextChunker::new(3, 10).chunk_document(&doc("abcdef"));
        assert_eq!(chunks.last().unwrap().char_end, 6);
    }
}
