//! Index build and query over an injected embedder and similarity store

use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{Chunk, QueryResult, ScoredChunk};

use super::store::{FlatVectorStore, SimilarityStore};

/// Creates a fresh, empty similarity store for each build
pub type StoreFactory = Arc<dyn Fn() -> Box<dyn SimilarityStore> + Send + Sync>;

struct IndexInner {
    id: Uuid,
    chunks: Vec<Chunk>,
    store: Box<dyn SimilarityStore>,
    dimensions: usize,
    embedding_model: String,
    built_at: chrono::DateTime<chrono::Utc>,
}

/// A built index: the chunks plus their vectors in a similarity store
///
/// Read-only once built. Cloning is cheap and clones can be queried from
/// several tasks at once.
#[derive(Clone)]
pub struct IndexHandle {
    inner: Arc<IndexInner>,
}

impl IndexHandle {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Chunks in insertion order
    pub fn chunks(&self) -> &[Chunk] {
        &self.inner.chunks
    }

    pub fn len(&self) -> usize {
        self.inner.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.chunks.is_empty()
    }

    /// Embedding dimensionality shared by every stored vector
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    /// Model the chunks were embedded with
    pub fn embedding_model(&self) -> &str {
        &self.inner.embedding_model
    }

    pub fn built_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.built_at
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("id", &self.inner.id)
            .field("chunks", &self.inner.chunks.len())
            .field("dimensions", &self.inner.dimensions)
            .field("embedding_model", &self.inner.embedding_model)
            .field("store", &self.inner.store.name())
            .finish()
    }
}

/// Builds indexes and answers nearest-neighbor queries against them
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store_factory: StoreFactory,
    batch_size: usize,
    embed_timeout: Duration,
    search_timeout: Duration,
}

impl Indexer {
    /// Indexer backed by the in-memory flat store
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Self {
        Self {
            embedder,
            store_factory: Arc::new(|| Box::new(FlatVectorStore::new()) as Box<dyn SimilarityStore>),
            batch_size: config.embeddings.batch_size.max(1),
            embed_timeout: config.embeddings.timeout(),
            search_timeout: config.retrieval.search_timeout(),
        }
    }

    /// Use a different similarity store implementation
    pub fn with_store_factory(mut self, factory: StoreFactory) -> Self {
        self.store_factory = factory;
        self
    }

    /// Embed every chunk and load it into a fresh similarity store
    ///
    /// Any embedding failure aborts the build; no partially built handle
    /// is ever returned. An empty chunk list yields an empty handle.
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<IndexHandle> {
        let start = Instant::now();
        let mut store = (self.store_factory)();
        let mut dimensions: Option<usize> = None;

        tracing::info!(
            "Building index from {} chunks with {} ({})",
            chunks.len(),
            self.embedder.name(),
            self.embedder.model()
        );

        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let offset = batch_no * self.batch_size;
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let deadline = self.embed_timeout.saturating_mul(batch.len() as u32);

            let vectors = tokio::time::timeout(deadline, self.embedder.embed_batch(&texts))
                .await
                .map_err(|_| {
                    Error::embedding(format!(
                        "embedding chunks {}..{} ({}) timed out after {:?}",
                        offset,
                        offset + batch.len(),
                        batch[0].document_id,
                        deadline
                    ))
                })?
                .map_err(|e| {
                    Error::embedding(format!(
                        "chunks {}..{} ({}): {}",
                        offset,
                        offset + batch.len(),
                        batch[0].document_id,
                        embedding_message(e)
                    ))
                })?;

            if vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "provider returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (i, (vector, chunk)) in vectors.into_iter().zip(batch).enumerate() {
                let chunk_ref = offset + i;
                if vector.is_empty() {
                    return Err(Error::embedding(format!(
                        "chunk {} of {} has an empty embedding",
                        chunk.chunk_index, chunk.document_id
                    )));
                }
                match dimensions {
                    None => {
                        if vector.len() != self.embedder.dimensions() {
                            tracing::warn!(
                                "Model {} produced {} dimensions, configured {}",
                                self.embedder.model(),
                                vector.len(),
                                self.embedder.dimensions()
                            );
                        }
                        dimensions = Some(vector.len());
                    }
                    Some(dims) if dims != vector.len() => {
                        return Err(Error::embedding(format!(
                            "chunk {} of {} has {} dimensions, index has {}",
                            chunk.chunk_index,
                            chunk.document_id,
                            vector.len(),
                            dims
                        )));
                    }
                    Some(_) => {}
                }
                store.insert(vector, chunk_ref).await?;
            }
        }

        let handle = IndexHandle {
            inner: Arc::new(IndexInner {
                id: Uuid::new_v4(),
                dimensions: dimensions.unwrap_or_else(|| self.embedder.dimensions()),
                embedding_model: self.embedder.model().to_string(),
                built_at: chrono::Utc::now(),
                chunks,
                store,
            }),
        };

        tracing::info!(
            "Index {} built: {} vectors, {} dimensions in {}ms",
            handle.id(),
            handle.len(),
            handle.dimensions(),
            start.elapsed().as_millis()
        );

        Ok(handle)
    }

    /// Top-`k` chunks for a question, by descending similarity
    ///
    /// Equal scores keep the order the chunks were inserted in.
    pub async fn query<'h>(
        &self,
        handle: &'h IndexHandle,
        question: &str,
        k: usize,
    ) -> Result<QueryResult<'h>> {
        if handle.is_empty() {
            return Err(Error::EmptyIndex);
        }
        if self.embedder.model() != handle.embedding_model() {
            return Err(Error::IndexMismatch {
                expected: format!("model {}", handle.embedding_model()),
                actual: format!("model {}", self.embedder.model()),
            });
        }

        let start = Instant::now();
        let query_embedding = tokio::time::timeout(self.embed_timeout, self.embedder.embed(question))
            .await
            .map_err(|_| {
                Error::embedding(format!("question embedding timed out after {:?}", self.embed_timeout))
            })?
            .map_err(|e| Error::embedding(format!("question: {}", embedding_message(e))))?;

        if query_embedding.len() != handle.dimensions() {
            return Err(Error::IndexMismatch {
                expected: format!("{} dimensions", handle.dimensions()),
                actual: format!("{} dimensions", query_embedding.len()),
            });
        }

        if k == 0 {
            return Ok(QueryResult::default());
        }

        let mut hits = tokio::time::timeout(
            self.search_timeout,
            handle.inner.store.search(&query_embedding, k),
        )
        .await
        .map_err(|_| {
            Error::vector_store(format!("search timed out after {:?}", self.search_timeout))
        })??;

        // Don't rely on the store for tie order
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);

        let chunks = handle.chunks();
        let matches = hits
            .into_iter()
            .map(|(chunk_ref, similarity)| {
                chunks
                    .get(chunk_ref)
                    .map(|chunk| ScoredChunk { chunk, similarity })
                    .ok_or_else(|| {
                        Error::vector_store(format!("store returned unknown chunk ref {}", chunk_ref))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Retrieved {} chunks from index {} in {}ms",
            matches.len(),
            handle.id(),
            start.elapsed().as_millis()
        );

        Ok(QueryResult::new(matches))
    }
}

/// Provider errors all surface as `Error::Embedding`; avoid nesting its prefix
fn embedding_message(e: Error) -> String {
    match e {
        Error::Embedding(msg) => msg,
        other => other.to_string(),
    }
}
