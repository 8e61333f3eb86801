//! # chatdoc - Grounded Document Question Answering
//!
//! A retrieval-and-grounding pipeline for answering questions from
//! uploaded documents: deterministic chunking, pluggable embedding
//! providers, inner-product vector search, and a post-generation
//! grounding gate that replaces unsupported answers with a fixed
//! refusal.
//!
//! ## Overview
//!
//! chatdoc can be used in two ways:
//!
//! 1. **As a standalone CLI** - Run the `chatdoc-server` binary
//! 2. **As a library** - Import components into your own Rust project
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use chatdoc::pipeline::{DocumentRegistry, QaPipeline};
//! use chatdoc::rag::{DeterministicEmbeddingProvider, GroundingPolicy, TextChunker};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(DocumentRegistry::new());
//!     let document = registry.register("notes.txt", b"The sky is blue.");
//!
//!     let pipeline = QaPipeline::new(
//!         registry,
//!         Arc::new(DeterministicEmbeddingProvider::new()),
//!         Some(my_generation_client()),
//!         TextChunker::new(1200, 200)?,
//!         "vector_index",
//!         3,
//!         GroundingPolicy::default(),
//!     );
//!
//!     let entry = pipeline.answer(document.id, "What color is the sky?").await?;
//!     println!("{}", entry.answer);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embeddings, retrieval, prompts, grounding gate
//! - [`store`] - Vector stores (linear in-memory, persisted flat index)
//! - [`llm`] - Text generation boundary and adapters
//! - [`pipeline`] - Document registry and the answer pipeline
//! - [`config`] - Environment-driven configuration
//! - [`types`] - Common types and error handling
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | Local fastembed ONNX embedding models |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Environment-driven configuration.
pub mod config;
/// Text generation boundary and adapters.
pub mod llm;
/// Document registry and the answer pipeline.
pub mod pipeline;
/// Retrieval Augmented Generation components.
pub mod rag;
/// Vector stores.
pub mod store;
/// Core types and error handling.
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use llm::{Generation, GenerationClient, OpenAiGenerationClient};
pub use pipeline::{DocumentRegistry, QaPipeline};
pub use rag::{
    enforce_grounding, DeterministicEmbeddingProvider, EmbeddingProvider, EmbeddingProviderKind,
    GroundingPolicy, TextChunker,
};
pub use store::{FlatVectorStore, MemoryVectorStore, VectorStore};
pub use types::{AppError, Chunk, DocumentRecord, QueryLogEntry, Result, ScoredChunk};
