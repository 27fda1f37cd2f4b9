//! Retrieval layer for sqlrag
//!
//! This crate provides the knowledge-base text splitter, a local embedding
//! model, the persisted vector index and the retriever built on top of it.

mod embedder;
mod retriever;
mod text_splitter;
mod vector_index;


pub use embedder::LocalEmbedder;
pub use retriever::{DEFAULT_TOP_K, RetrievedContext, Retriever};
pub use text_splitter::{SplitterConfig, TextSplitter};
pub use vector_index::{
    INDEX_FILE, IndexConfig, IndexOrigin, SearchHit, VectorEntry, VectorIndex, cosine_similarity,
};

// Re-export core types for convenience
pub use sqlrag_core::{EmbeddingProvider, Error, Result};
