//! Local hashed bag-of-words embedding model

use async_trait::async_trait;

use sqlrag_core::{EmbeddingProvider, Result};

/// Deterministic offline embedding model.
///
/// Tokens and token bigrams are hashed (MD5, so vectors are stable across
/// builds and platforms) into a fixed number of buckets and the result is
/// L2-normalized. Good enough to rank knowledge-base sections by shared
/// vocabulary without any network access.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dimension: usize,
    model_id: String,
}

impl LocalEmbedder {
    pub const DEFAULT_DIMENSION: usize = 384;

    pub fn new() -> Self {
        Self::with_dimension(Self::DEFAULT_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("local/hashed-bow-{}", dimension),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn bucket(&self, bytes: &[u8]) -> usize {
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[..4]);
        (u32::from_le_bytes(word) as usize) % self.dimension
    }

    /// Generate the embedding for one piece of text
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();

        let mut embedding = vec![0.0f32; self.dimension];

        for word in &words {
            let digest = md5::compute(word.as_bytes());
            embedding[self.bucket(&digest[0..4])] += 1.0;
            embedding[self.bucket(&digest[4..8])] += 0.7;
            embedding[self.bucket(&digest[8..12])] += 0.5;
        }

        for pair in words.windows(2) {
            let digest = md5::compute(format!("{} {}", pair[0], pair[1]).as_bytes());
            embedding[self.bucket(&digest[0..4])] += 0.8;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

impl Default for LocalEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}
