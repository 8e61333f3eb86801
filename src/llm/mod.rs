//! Text generation boundary.
//!
//! The pipeline consumes generation through a single trait; the only
//! assumption about the backend is "accepts a prompt, returns text plus
//! an optional token count".

use crate::types::Result;
use async_trait::async_trait;

mod openai;

pub use openai::OpenAiGenerationClient;

/// One generation call's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// The candidate answer text.
    pub text: String,
    /// Token usage reported by the backend, when it reports one.
    pub tokens_used: Option<u32>,
}

/// A pluggable text-generation backend.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a candidate answer for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<Generation>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;
}

/// Rough token estimate for backends that report no usage: whitespace
/// word count.
pub fn estimate_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
