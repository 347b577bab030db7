//! Similarity store abstraction and the in-memory flat implementation

use async_trait::async_trait;

use crate::error::{Error, Result};

/// A stored vector's position in the index's chunk list
pub type ChunkRef = usize;

/// Trait for vector storage and nearest-neighbor search
///
/// Implementations:
/// - `FlatVectorStore`: exact in-memory cosine search
#[async_trait]
pub trait SimilarityStore: Send + Sync {
    /// Insert a vector for a chunk
    async fn insert(&mut self, vector: Vec<f32>, chunk_ref: ChunkRef) -> Result<()>;

    /// Up to `k` nearest chunks, ordered by descending similarity
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkRef, f32)>>;

    /// Number of stored vectors
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality of stored vectors, once the first one is inserted
    fn dimensions(&self) -> Option<usize>;

    /// Get store name for logging
    fn name(&self) -> &str;
}

struct StoredVector {
    chunk_ref: ChunkRef,
    vector: Vec<f32>,
    norm: f32,
}

/// Brute-force cosine similarity over every stored vector
///
/// Results with equal scores keep insertion order.
#[derive(Default)]
pub struct FlatVectorStore {
    entries: Vec<StoredVector>,
}

impl FlatVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SimilarityStore for FlatVectorStore {
    async fn insert(&mut self, vector: Vec<f32>, chunk_ref: ChunkRef) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::vector_store("cannot insert an empty vector"));
        }
        if let Some(dims) = self.dimensions() {
            if vector.len() != dims {
                return Err(Error::vector_store(format!(
                    "vector for chunk {} has {} dimensions, store holds {}",
                    chunk_ref,
                    vector.len(),
                    dims
                )));
            }
        }

        let norm = l2_norm(&vector);
        self.entries.push(StoredVector {
            chunk_ref,
            vector,
            norm,
        });
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<(ChunkRef, f32)>> {
        if let Some(dims) = self.dimensions() {
            if query.len() != dims {
                return Err(Error::vector_store(format!(
                    "query has {} dimensions, store holds {}",
                    query.len(),
                    dims
                )));
            }
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(ChunkRef, f32)> = self
            .entries
            .iter()
            .map(|e| (e.chunk_ref, cosine_similarity(query, query_norm, &e.vector, e.norm)))
            .collect();

        // Stable: ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.vector.len())
    }

    fn name(&self) -> &str {
        "flat-cosine"
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors and NaN inputs score lowest
fn cosine_similarity(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_nan() {
        f32::NEG_INFINITY
    } else {
        similarity
    }
}
