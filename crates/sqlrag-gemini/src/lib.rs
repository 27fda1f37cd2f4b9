//! Gemini integration for sqlrag
//!
//! This crate provides the Gemini implementations of the `LLMProvider` and
//! `EmbeddingProvider` traits.

mod client;
mod config;
mod embeddings;


pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use embeddings::GeminiEmbedder;

// Re-export core types for convenience
pub use sqlrag_core::{
    EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider, Result,
};
