//! Embedding index: build once, query many times

mod index;
mod store;

pub use index::{IndexHandle, Indexer, StoreFactory};
pub use store::{ChunkRef, FlatVectorStore, SimilarityStore};
