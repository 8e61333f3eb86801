//! Retrieval-augmented generation building blocks: chunking, embedding,
//! retrieval, prompting, and the grounding gate.

pub mod chunker;
pub mod embeddings;
pub mod grounding;
pub mod prompts;
pub mod retriever;

pub use chunker::{chunk_text, TextChunker};
pub use embeddings::{DeterministicEmbeddingProvider, EmbeddingProvider, EmbeddingProviderKind};
pub use grounding::{enforce_grounding, is_answer_grounded, GroundingPolicy};
pub use retriever::{assemble_context, retrieve_context, retrieve_from_store};
