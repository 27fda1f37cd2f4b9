//! Common types used across the sqlrag system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation strategy that produced a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Method {
    /// Retrieval-augmented generation over the knowledge base
    #[default]
    #[serde(rename = "RAG")]
    Rag,
    /// Schema-only prompt, no retrieval
    #[serde(rename = "DIRECT")]
    Direct,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Rag => "RAG",
            Method::Direct => "DIRECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result object returned to callers of the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn success(query: impl Into<String>, method: Method) -> Self {
        Self {
            success: true,
            query: Some(query.into()),
            method,
            error: None,
        }
    }

    pub fn failure(error: impl fmt::Display, method: Method) -> Self {
        Self {
            success: false,
            query: None,
            method,
            error: Some(error.to_string()),
        }
    }
}
