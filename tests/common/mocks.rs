//! Mock implementations for testing.
//!
//! Provides mock generation clients and instrumented embedding
//! providers shared across integration test files.

use async_trait::async_trait;
use chatdoc::llm::{Generation, GenerationClient};
use chatdoc::rag::{DeterministicEmbeddingProvider, EmbeddingProvider};
use chatdoc::types::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock generation client with a configurable canned answer.
///
/// Counts its invocations so tests can assert that the pipeline did
/// (or did not) consult the generation backend.
pub struct MockGenerationClient {
    response: String,
    tokens_used: Option<u32>,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockGenerationClient {
    /// Client that always returns `response` with no token usage.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            tokens_used: None,
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Client that reports a token count alongside the response.
    pub fn with_tokens(response: &str, tokens_used: u32) -> Self {
        Self {
            tokens_used: Some(tokens_used),
            ..Self::new(response)
        }
    }

    /// Client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// How many times `generate` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for MockGenerationClient {
    async fn generate(&self, _prompt: &str) -> Result<Generation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::Generation("mock generation failure".to_string()));
        }
        Ok(Generation {
            text: self.response.clone(),
            tokens_used: self.tokens_used,
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Embedding provider that delegates to the deterministic provider
/// while counting embed calls, so tests can prove ingestion ran (or
/// was skipped).
pub struct CountingEmbeddingProvider {
    inner: DeterministicEmbeddingProvider,
    calls: Arc<AtomicUsize>,
}

impl CountingEmbeddingProvider {
    /// Create a counting provider and a handle to its call counter.
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: DeterministicEmbeddingProvider::new(),
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(texts).await
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }
}
