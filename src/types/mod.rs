use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= Retrieval Types =============

/// A contiguous slice of document text with a stable position index.
///
/// Chunks are immutable once produced by the chunker and are carried as
/// metadata through the vector store, so every answer can be traced
/// back to source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk's text content.
    pub chunk_text: String,
    /// 0-based emission order within the document.
    pub chunk_index: usize,
}

/// A chunk returned by similarity search, best-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The cited chunk.
    pub chunk: Chunk,
    /// Inner-product similarity against the query embedding.
    pub score: f32,
}

// ============= Document Types =============

/// An uploaded document tracked by the answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Unique document identifier.
    pub id: Uuid,
    /// Original filename, for operator-facing logs.
    pub filename: String,
    /// Decoded document text (UTF-8, invalid sequences dropped).
    pub text: String,
    /// Set to true once the document's index has been persisted.
    pub is_processed: bool,
    /// Upload timestamp.
    pub uploaded_at: DateTime<Utc>,
}

/// One question/answer interaction against a document.
///
/// Created once per answered question (including refusals) and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    /// The user's question, verbatim.
    pub question: String,
    /// The final answer after the grounding gate (may be the refusal).
    pub answer: String,
    /// Wall-clock time spent answering, in milliseconds.
    pub latency_ms: u64,
    /// Token usage reported by the generation call, if any.
    pub tokens_used: Option<u32>,
    /// The citations backing the answer, similarity-descending.
    pub citations: Vec<Chunk>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ============= Error Types =============

/// Application-level error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid parameters (e.g. chunk overlap >= chunk size). Fatal,
    /// never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Ingestion failed (empty text, zero chunks, embedding count
    /// mismatch). Document state is left unchanged.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Embedding dimension disagrees with the store, at add or load
    /// time.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Persisted index artifacts are inconsistent or unreadable.
    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    /// Missing credential or configuration for a hosted provider.
    /// Surfaced immediately, never retried.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The external generation call failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// A referenced document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<chatdoc_vector::Error> for AppError {
    fn from(err: chatdoc_vector::Error) -> Self {
        match err {
            chatdoc_vector::Error::DimensionMismatch { expected, actual } => {
                AppError::DimensionMismatch { expected, actual }
            }
            chatdoc_vector::Error::Corrupt(msg) => AppError::IndexCorrupt(msg),
            chatdoc_vector::Error::Persistence(msg) => AppError::IndexCorrupt(msg),
            chatdoc_vector::Error::Io(e) => AppError::Io(e),
            chatdoc_vector::Error::InvalidVector(msg) => AppError::Ingestion(msg),
            chatdoc_vector::Error::Configuration(msg) => AppError::Configuration(msg),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AppError>;
