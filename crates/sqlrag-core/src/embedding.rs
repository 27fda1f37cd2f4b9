//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding models (text in, fixed-length vector out)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier persisted alongside vectors; indexes built with another model are rejected
    fn model_id(&self) -> &str;

    /// Embed a batch of documents, preserving order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}
