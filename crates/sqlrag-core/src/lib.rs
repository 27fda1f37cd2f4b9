//! Core traits and types for sqlrag
//!
//! This crate defines the fundamental traits and types used across the sqlrag system.
//! It provides capability-facing interfaces for LLM providers and embedding models,
//! the shared error taxonomy, and the readiness record used for lazy initialization.

pub mod embedding;
pub mod error;
pub mod llm;
pub mod readiness;
pub mod types;

pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use llm::{GenerationConfig, GenerationResult, LLMProvider};
pub use readiness::{Readiness, ReadyCell};
pub use types::{GenerationResponse, Method};
