//! Service configuration

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use sqlrag_core::{Error, Method, Result};
use sqlrag_gemini::GeminiConfig;
use sqlrag_rag::{DEFAULT_TOP_K, IndexConfig, SplitterConfig};

use crate::prompt::PromptAssembler;

pub const DEFAULT_KNOWLEDGE_FILE: &str = "knowledge/sql_knowledge_base.txt";
pub const DEFAULT_INDEX_DIR: &str = "sql_vector_db";

/// Which embedding model backs the vector index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingBackend {
    /// Offline hashed bag-of-words vectors
    #[default]
    Local,
    /// Gemini embedding API
    Gemini,
}

impl FromStr for EmbeddingBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "gemini" => Ok(Self::Gemini),
            other => Err(Error::Configuration(format!(
                "unknown embedding backend '{}' (expected 'local' or 'gemini')",
                other
            ))),
        }
    }
}

/// Everything the SQL generation service needs to start
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gemini: GeminiConfig,
    pub knowledge_file: PathBuf,
    pub index_dir: PathBuf,
    pub embeddings: EmbeddingBackend,
    pub top_k: usize,
    pub splitter: SplitterConfig,
    pub dialect: String,
    pub method: Method,
    /// Run `QueryGuard` on every sanitized query
    pub strict: bool,
}

impl ServiceConfig {
    /// Defaults around an explicit Gemini configuration
    pub fn new(gemini: GeminiConfig) -> Self {
        Self {
            gemini,
            knowledge_file: PathBuf::from(DEFAULT_KNOWLEDGE_FILE),
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            embeddings: EmbeddingBackend::default(),
            top_k: DEFAULT_TOP_K,
            splitter: SplitterConfig::default(),
            dialect: PromptAssembler::DEFAULT_DIALECT.to_string(),
            method: Method::Rag,
            strict: false,
        }
    }

    /// Create configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new(GeminiConfig::from_lookup(&lookup)?);

        if let Some(path) = non_empty("SQLRAG_KNOWLEDGE_FILE") {
            config.knowledge_file = PathBuf::from(path);
        }
        if let Some(path) = non_empty("SQLRAG_INDEX_DIR") {
            config.index_dir = PathBuf::from(path);
        }
        if let Some(backend) = non_empty("SQLRAG_EMBEDDINGS") {
            config.embeddings = backend.parse()?;
        }
        if let Some(top_k) = non_empty("SQLRAG_TOP_K") {
            config.top_k = parse_count("SQLRAG_TOP_K", &top_k)?;
        }
        if let Some(size) = non_empty("SQLRAG_CHUNK_SIZE") {
            config.splitter.chunk_size = parse_count("SQLRAG_CHUNK_SIZE", &size)?;
        }
        if let Some(overlap) = non_empty("SQLRAG_CHUNK_OVERLAP") {
            config.splitter.chunk_overlap = parse_count("SQLRAG_CHUNK_OVERLAP", &overlap)?;
        }
        if let Some(dialect) = non_empty("SQLRAG_DIALECT") {
            config.dialect = dialect.trim().to_string();
        }

        Ok(config)
    }

    pub fn index_config(&self) -> IndexConfig {
        IndexConfig {
            index_dir: self.index_dir.clone(),
            knowledge_file: self.knowledge_file.clone(),
            splitter: self.splitter.clone(),
        }
    }
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim().parse().map_err(|_| {
        Error::Configuration(format!("{} must be a non-negative integer, got '{}'", key, raw))
    })
}
