//! Environment-driven configuration.
//!
//! All knobs come from environment variables (with a `.env` file picked
//! up by the binary), every one of them defaulted except hosted-provider
//! credentials.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::types::{AppError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Chunking and retrieval parameters.
    pub rag: RagConfig,
    /// Embedding provider selection.
    pub embedding: EmbeddingConfig,
    /// Generation backend configuration.
    pub llm: LlmConfig,
    /// Persisted index location.
    pub index: IndexConfig,
    /// Grounding gate strength.
    pub grounding: GroundingConfig,
}

/// Chunking and retrieval parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Overlap in characters between consecutive chunks.
    pub overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

/// Embedding provider selection.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "deterministic", "openai" or "local".
    pub provider: String,
    /// Embedding model identifier for hosted/local providers.
    pub model: String,
    /// API key for the hosted provider.
    pub openai_api_key: Option<String>,
    /// Base URL of the hosted embedding API.
    pub openai_api_base: String,
}

/// Generation backend configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key for the hosted generation provider.
    pub openai_api_key: Option<String>,
    /// Base URL of the hosted generation API.
    pub openai_api_base: String,
    /// Chat model identifier.
    pub model: String,
}

/// Persisted index location.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Root directory holding one index directory per document.
    pub root: PathBuf,
}

/// Grounding gate strength.
#[derive(Debug, Clone, Deserialize)]
pub struct GroundingConfig {
    /// When false, only citation presence is checked.
    pub lexical: bool,
    /// Minimum shared non-stopword tokens for the lexical check.
    pub min_overlap: usize,
}

impl Config {
    /// Build a configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rag: RagConfig {
                max_chars: parse_env("CHUNK_MAX_CHARS", 1200)?,
                overlap: parse_env("CHUNK_OVERLAP", 200)?,
                top_k: parse_env("RETRIEVAL_TOP_K", 3)?,
            },
            embedding: EmbeddingConfig {
                provider: env::var("EMBEDDING_PROVIDER")
                    .unwrap_or_else(|_| "deterministic".to_string()),
                model: env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                openai_api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            },
            llm: LlmConfig {
                openai_api_key: env::var("OPENAI_API_KEY").ok(),
                openai_api_base: env::var("OPENAI_API_BASE")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            },
            index: IndexConfig {
                root: PathBuf::from(
                    env::var("VECTOR_INDEX_ROOT").unwrap_or_else(|_| "vector_index".to_string()),
                ),
            },
            grounding: GroundingConfig {
                lexical: parse_env("GROUNDING_LEXICAL", true)?,
                min_overlap: parse_env("GROUNDING_MIN_OVERLAP", 1)?,
            },
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::Configuration(format!("invalid value for {}: {:?}", key, raw))
        }),
        Err(_) => Ok(default),
    }
}
