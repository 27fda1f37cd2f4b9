//! SQL generation service for sqlrag
//!
//! Ties retrieval, prompt assembly, generation and sanitization together
//! behind `SqlRagService`.

mod config;
mod guard;
mod prompt;
pub mod sanitizer;
mod service;


pub use config::{DEFAULT_INDEX_DIR, DEFAULT_KNOWLEDGE_FILE, EmbeddingBackend, ServiceConfig};
pub use guard::{DANGEROUS_KEYWORDS, QueryGuard};
pub use prompt::PromptAssembler;
pub use service::{ComponentFactory, DefaultComponents, SqlRagService};

// Re-export core types
pub use sqlrag_core::{Error, GenerationResponse, Method, Result};
