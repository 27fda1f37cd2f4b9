//! SQL generation service
//!
//! `SqlRagService` owns three lazily constructed resources: the embedding
//! model, the vector index and the generation client. Each is created on the
//! first request that needs it and kept for the life of the process.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use sqlrag_core::{
    EmbeddingProvider, Error, GenerationConfig, GenerationResponse, LLMProvider, Method,
    ReadyCell, Result,
};
use sqlrag_gemini::{GeminiClient, GeminiEmbedder};
use sqlrag_rag::{LocalEmbedder, Retriever, VectorIndex};

use crate::config::{EmbeddingBackend, ServiceConfig};
use crate::guard::QueryGuard;
use crate::prompt::PromptAssembler;
use crate::sanitizer;

/// Constructs the external capabilities the service depends on
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    async fn embedder(&self, config: &ServiceConfig) -> Result<Arc<dyn EmbeddingProvider>>;

    async fn llm(&self, config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>>;
}

/// Factory for the production components: Gemini for generation, local or
/// Gemini embeddings depending on configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComponents;

#[async_trait]
impl ComponentFactory for DefaultComponents {
    async fn embedder(&self, config: &ServiceConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings {
            EmbeddingBackend::Local => Arc::new(LocalEmbedder::new()),
            EmbeddingBackend::Gemini => Arc::new(GeminiEmbedder::new(config.gemini.clone())?),
        };
        Ok(embedder)
    }

    async fn llm(&self, config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>> {
        let client = GeminiClient::new(config.gemini.clone())?;
        Ok(Arc::new(client))
    }
}

/// Natural-language question + schema → sanitized SELECT statement
pub struct SqlRagService {
    config: ServiceConfig,
    factory: Box<dyn ComponentFactory>,
    assembler: PromptAssembler,
    guard: Option<QueryGuard>,
    embedder: ReadyCell<Arc<dyn EmbeddingProvider>>,
    index: ReadyCell<VectorIndex>,
    llm: ReadyCell<Arc<dyn LLMProvider>>,
}

impl SqlRagService {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_factory(config, DefaultComponents)
    }

    /// Create the service from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ServiceConfig::from_env()?))
    }

    pub fn with_factory(config: ServiceConfig, factory: impl ComponentFactory + 'static) -> Self {
        let assembler = PromptAssembler::new(config.dialect.clone());
        let guard = config.strict.then(QueryGuard::new);
        Self {
            config,
            factory: Box::new(factory),
            assembler,
            guard,
            embedder: ReadyCell::new("embeddings"),
            index: ReadyCell::new("vector index"),
            llm: ReadyCell::new("LLM"),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn method(&self) -> Method {
        self.config.method
    }

    /// Generate one SELECT statement, wrapping any failure in `Error::SqlGeneration`
    pub async fn generate_sql(&mut self, question: &str, schema: &str) -> Result<String> {
        let method = self.method();
        self.try_generate(question, schema).await.map_err(|e| {
            error!(%method, error = %e, "SQL generation failed");
            Error::SqlGeneration {
                method,
                message: e.to_string(),
            }
        })
    }

    /// Generate and package the outcome as the caller-facing result object
    pub async fn respond(&mut self, question: &str, schema: &str) -> GenerationResponse {
        let method = self.method();
        match self.generate_sql(question, schema).await {
            Ok(sql) => GenerationResponse::success(sql, method),
            Err(e) => GenerationResponse::failure(e, method),
        }
    }

    async fn try_generate(&mut self, question: &str, schema: &str) -> Result<String> {
        let prompt = match self.config.method {
            Method::Rag => {
                let top_k = self.config.top_k;
                let index = self.ensure_index().await?;
                let context = Retriever::new(index)
                    .with_top_k(top_k)
                    .retrieve(question)
                    .await?;
                self.assembler.assemble(schema, &context.text, question)
            }
            Method::Direct => self.assembler.assemble_direct(schema, question),
        };

        let llm = self.ensure_llm().await?;
        let generation = GenerationConfig {
            model_id: llm.model_id().to_string(),
            ..Default::default()
        };
        let raw = llm.generate_with_config(&prompt, &generation).await?;
        tracing::debug!(raw = %raw.text, tokens = ?raw.tokens_used, "received completion");

        let sql = sanitizer::clean(&raw.text)?;
        if let Some(guard) = &self.guard {
            guard.check(&sql)?;
        }

        info!(%sql, "generated SQL");
        Ok(sql)
    }

    async fn ensure_embedder(&mut self) -> Result<Arc<dyn EmbeddingProvider>> {
        let Self {
            config,
            factory,
            embedder,
            ..
        } = self;

        let embedder = embedder
            .ensure_ready(|| {
                info!("Initializing embeddings...");
                factory.embedder(config)
            })
            .await?;
        Ok(embedder.clone())
    }

    async fn ensure_index(&mut self) -> Result<&VectorIndex> {
        let embedder = self.ensure_embedder().await?;
        let Self { config, index, .. } = self;

        let index = index
            .ensure_ready(|| async move {
                info!("Initializing vector database...");
                let mut index = VectorIndex::new(config.index_config(), embedder);
                index.build_or_load().await?;
                Ok(index)
            })
            .await?;
        Ok(index)
    }

    async fn ensure_llm(&mut self) -> Result<Arc<dyn LLMProvider>> {
        let Self {
            config,
            factory,
            llm,
            ..
        } = self;

        let llm = llm
            .ensure_ready(|| {
                info!("Initializing LLM...");
                factory.llm(config)
            })
            .await?;
        Ok(llm.clone())
    }

    /// Readiness of (embeddings, vector index, LLM)
    pub fn readiness(&self) -> (bool, bool, bool) {
        (
            self.embedder.is_ready(),
            self.index.is_ready(),
            self.llm.is_ready(),
        )
    }
}
