//! Retrieval results and answer records

use serde::Serialize;
use uuid::Uuid;

use super::document::Chunk;

/// A retrieved chunk with its similarity to the question
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoredChunk<'a> {
    /// The chunk, borrowed from the index it was retrieved from
    pub chunk: &'a Chunk,
    /// Cosine similarity (higher is more similar)
    pub similarity: f32,
}

/// Chunks retrieved for one question, ordered by descending similarity
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult<'a> {
    pub matches: Vec<ScoredChunk<'a>>,
}

impl<'a> QueryResult<'a> {
    pub fn new(matches: Vec<ScoredChunk<'a>>) -> Self {
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk<'a>> {
        self.matches.iter()
    }

    /// Distinct source document ids, in order of first appearance
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for m in &self.matches {
            if !sources.iter().any(|s| s == &m.chunk.document_id) {
                sources.push(m.chunk.document_id.clone());
            }
        }
        sources
    }
}

/// One completed question/answer exchange
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    /// Request ID (also carried by inference errors)
    pub request_id: Uuid,
    /// The question as asked
    pub question: String,
    /// Context block sent to the inference endpoint
    pub context: String,
    /// Response text, unmodified
    pub answer: String,
    /// Documents consulted, in retrieval order
    pub sources: Vec<String>,
    /// Model that produced the answer
    pub model: String,
    /// Time taken by the inference call
    pub processing_time_ms: u64,
    /// Completion timestamp
    pub answered_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_are_distinct_in_first_seen_order() {
        let a1 = Chunk::new("b.pdf".into(), "one".into(), 0, 3, 0);
        let a2 = Chunk::new("a.pdf".into(), "two".into(), 0, 3, 0);
        let a3 = Chunk::new("b.pdf".into(), "three".into(), 3, 8, 1);

        let result = QueryResult::new(vec![
            ScoredChunk { chunk: &a1, similarity: 0.9 },
            ScoredChunk { chunk: &a2, similarity: 0.8 },
            ScoredChunk { chunk: &a3, similarity: 0.7 },
        ]);

        assert_eq!(result.sources(), vec!["b.pdf".to_string(), "a.pdf".to_string()]);
    }
}
