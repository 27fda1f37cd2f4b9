//! Error types for sqlrag

use thiserror::Error;

use crate::types::Method;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Longest slice of rejected model output echoed back in an error message
const PREVIEW_CHARS: usize = 80;

/// Core error types for the sqlrag system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load vector index: {0}")]
    IndexLoad(String),

    #[error("Vector index queried before it was built or loaded")]
    IndexNotReady,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Empty SQL query generated")]
    EmptyGeneration,

    #[error("Generated query is not a SELECT statement: {0}")]
    NotASelect(String),

    #[error("Generated query rejected by query guard: {0}")]
    UnsafeQuery(String),

    #[error("Failed to generate SQL query using {method}: {message}")]
    SqlGeneration { method: Method, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Build a `NotASelect` error carrying a bounded preview of the rejected text
    pub fn not_a_select(statement: &str) -> Self {
        Error::NotASelect(preview(statement))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Truncate `text` to a diagnosable preview
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_select_preview_is_bounded() {
        let long = format!("DROP TABLE {}", "x".repeat(500));
        let message = Error::not_a_select(&long).to_string();

        assert!(message.starts_with("Generated query is not a SELECT statement: DROP TABLE"));
        assert!(message.ends_with("..."));
        assert!(message.len() < 200);
    }

    #[test]
    fn test_short_preview_is_untouched() {
        assert_eq!(preview("DROP TABLE users"), "DROP TABLE users");
    }
}
