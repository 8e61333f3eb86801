//! Error types for chatdoc-vector.

use thiserror::Error;

/// Result type for chatdoc-vector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in chatdoc-vector operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Dimension mismatch between a vector and the index.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions.
        expected: usize,
        /// Actual dimensions provided.
        actual: usize,
    },

    /// Invalid vector (e.g., empty, contains NaN).
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Invalid index configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Persisted artifact is unreadable or internally inconsistent.
    #[error("Corrupt index artifact: {0}")]
    Corrupt(String),

    /// Persistence error (serialization, artifact layout).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
