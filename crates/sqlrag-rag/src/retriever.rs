//! Retriever: top-K knowledge chunks for a question

use serde::Serialize;

use sqlrag_core::Result;

use crate::vector_index::{SearchHit, VectorIndex};

/// Number of chunks retrieved per question unless configured otherwise
pub const DEFAULT_TOP_K: usize = 4;

/// Chunks retrieved for one question
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    pub hits: Vec<SearchHit>,
    /// Chunk texts joined with blank lines, nearest first
    pub text: String,
}

impl RetrievedContext {
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        let text = hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self { hits, text }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Similarity retriever over a ready `VectorIndex`
pub struct Retriever<'a> {
    index: &'a VectorIndex,
    top_k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a VectorIndex) -> Self {
        Self {
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        let hits = self.index.query(query, self.top_k).await?;
        tracing::debug!(
            requested = self.top_k,
            returned = hits.len(),
            "retrieved knowledge chunks"
        );
        Ok(RetrievedContext::from_hits(hits))
    }
}
