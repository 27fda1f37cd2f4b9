//! Gemini embedding client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sqlrag_core::{EmbeddingProvider, Error, Result};

use crate::client::{Content, Part, build_http_client, post_json};
use crate::config::GeminiConfig;

/// Maximum number of texts per `batchEmbedContents` call
const MAX_BATCH: usize = 100;

/// Gemini embedding client
pub struct GeminiEmbedder {
    config: GeminiConfig,
    client: Client,
    model_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

impl GeminiEmbedder {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = build_http_client(&config)?;
        let model_id = format!("gemini/{}", config.embedding_model);
        Ok(Self {
            config,
            client,
            model_id,
        })
    }

    fn request<'a>(&self, text: &'a str, task_type: &'static str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            task_type,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self
            .config
            .endpoint(&self.config.embedding_model, "batchEmbedContents");
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let body = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|t| self.request(t, "RETRIEVAL_DOCUMENT"))
                    .collect(),
            };

            let response: BatchEmbedResponse = post_json(&self.client, &self.config, &url, &body)
                .await
                .map_err(Error::Embedding)?;

            if response.embeddings.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "expected {} embeddings, Gemini returned {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }

            vectors.extend(response.embeddings.into_iter().map(|e| e.values));
            tracing::debug!(embedded = vectors.len(), total = texts.len(), "embedded batch");
        }

        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let url = self
            .config
            .endpoint(&self.config.embedding_model, "embedContent");
        let body = self.request(text, "RETRIEVAL_QUERY");

        let response: EmbedContentResponse = post_json(&self.client, &self.config, &url, &body)
            .await
            .map_err(Error::Embedding)?;

        Ok(response.embedding.values)
    }
}
