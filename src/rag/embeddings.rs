//! Embedding providers.
//!
//! All variants are interchangeable at the vector store boundary: a
//! store built with dimension D rejects vectors that are not length D,
//! so a provider's `dim()` must match every vector it returns.

use crate::config::EmbeddingConfig;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maps text to fixed-dimension numeric vectors.
///
/// Invariants: `embed` returns exactly one vector per input, and every
/// returned vector has length `dim()`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, one vector per text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed length of every vector this provider returns.
    fn dim(&self) -> usize;
}

// ============================================================================
// Provider selection
// ============================================================================

/// Embedding provider configuration.
///
/// Selected by configuration, not by runtime type inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Deterministic test provider: every component equals the text's
    /// character count. Reproducible and offline.
    Deterministic,

    /// Hosted embedding API (OpenAI-compatible).
    OpenAi {
        /// API key; absence is [`AppError::ProviderUnavailable`].
        api_key: Option<String>,
        /// Base URL, overridable for tests.
        api_base: String,
        /// Embedding model identifier.
        model: String,
    },

    /// Local fastembed model, loaded once per process and shared.
    #[cfg(feature = "local-embeddings")]
    Local {
        /// Model identifier (informational; BGE-small is loaded).
        model: String,
    },
}

impl EmbeddingProviderKind {
    /// Derive the provider selection from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.provider.as_str() {
            "deterministic" => Ok(EmbeddingProviderKind::Deterministic),
            "openai" => Ok(EmbeddingProviderKind::OpenAi {
                api_key: config.openai_api_key.clone(),
                api_base: config.openai_api_base.clone(),
                model: config.model.clone(),
            }),
            #[cfg(feature = "local-embeddings")]
            "local" => Ok(EmbeddingProviderKind::Local {
                model: config.model.clone(),
            }),
            other => Err(AppError::Configuration(format!(
                "unknown embedding provider: {:?}",
                other
            ))),
        }
    }

    /// Create a provider instance from this selection.
    pub fn create_provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self {
            EmbeddingProviderKind::Deterministic => {
                Ok(Arc::new(DeterministicEmbeddingProvider::new()))
            }
            EmbeddingProviderKind::OpenAi {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(OpenAiEmbeddingProvider::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            )?)),
            #[cfg(feature = "local-embeddings")]
            EmbeddingProviderKind::Local { .. } => Ok(Arc::new(LocalEmbeddingProvider::new()?)),
        }
    }
}

// ============================================================================
// Deterministic provider (tests, offline use)
// ============================================================================

/// Deterministic, cheap embeddings: every component of a text's vector
/// equals the text's character count. Dimension is fixed at 5.
#[derive(Debug, Default, Clone)]
pub struct DeterministicEmbeddingProvider;

impl DeterministicEmbeddingProvider {
    /// Fixed output dimension.
    pub const DIM: usize = 5;

    /// Create the provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| vec![t.chars().count() as f32; Self::DIM])
            .collect())
    }

    fn dim(&self) -> usize {
        Self::DIM
    }
}

// ============================================================================
// Hosted provider (OpenAI-compatible API)
// ============================================================================

/// Hosted embeddings via an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbeddingProvider {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingProvider {
    /// Create the provider.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ProviderUnavailable`] when no API key is
    /// configured. Credentials do not self-heal, so this is checked at
    /// construction rather than on first use.
    pub fn new(api_key: Option<String>, api_base: String, model: String) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::ProviderUnavailable("OPENAI_API_KEY is not set".into()))?;

        let dim = match model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        };

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            api_base,
            model,
            dim,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "embedding request returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("invalid embedding response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::Internal(format!(
                "embedding count mismatch: sent {}, received {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

// ============================================================================
// Local provider (fastembed)
// ============================================================================

#[cfg(feature = "local-embeddings")]
mod local {
    use super::*;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::{Mutex, OnceLock};

    // The model is expensive to load; share one instance per process.
    static MODEL: OnceLock<Mutex<TextEmbedding>> = OnceLock::new();

    fn shared_model() -> Result<&'static Mutex<TextEmbedding>> {
        if let Some(model) = MODEL.get() {
            return Ok(model);
        }
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::BGESmallENV15))
            .map_err(|e| AppError::Internal(format!("failed to load embedding model: {}", e)))?;
        Ok(MODEL.get_or_init(|| Mutex::new(model)))
    }

    /// Local embeddings via fastembed (BGE-small, 384 dimensions).
    ///
    /// Output vectors are normalized to unit length before being
    /// returned.
    pub struct LocalEmbeddingProvider {
        _private: (),
    }

    impl LocalEmbeddingProvider {
        /// Fixed output dimension of BGE-small.
        pub const DIM: usize = 384;

        /// Create the provider, loading the shared model if needed.
        pub fn new() -> Result<Self> {
            shared_model()?;
            Ok(Self { _private: () })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for LocalEmbeddingProvider {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let model = shared_model()?;
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();

            let mut guard = model
                .lock()
                .map_err(|_| AppError::Internal("embedding model lock poisoned".into()))?;
            let embeddings = guard
                .embed(inputs, None)
                .map_err(|e| AppError::Internal(format!("local embedding failed: {}", e)))?;
            drop(guard);

            Ok(embeddings.into_iter().map(normalize).collect())
        }

        fn dim(&self) -> usize {
            Self::DIM
        }
    }

    fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[cfg(feature = "local-embeddings")]
pub use local::LocalEmbeddingProvider;
