//! Vector stores.
//!
//! A store maps an internal sequential identifier to a `(vector, Chunk)`
//! pair. Identifiers are assigned in insertion order and never reused;
//! storage is append-only for the lifetime of the store.

use crate::types::{Chunk, Result, ScoredChunk};
use async_trait::async_trait;

mod flat;
mod memory;

pub use flat::FlatVectorStore;
pub use memory::MemoryVectorStore;

/// Similarity search over embedded chunks.
///
/// Every vector held by a store instance has the store's fixed
/// dimension. Search ranks by inner product, descending, with ties
/// broken by insertion order (earlier inserted wins).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store implementation name, for logs.
    fn name(&self) -> &str;

    /// The fixed vector dimension of this store.
    fn dim(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the store holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append vectors and their chunk metadata, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::types::AppError::DimensionMismatch`] when the
    /// two sequences differ in length or any vector is not `dim()`
    /// long. Nothing is appended on error.
    async fn add(&self, vectors: Vec<Vec<f32>>, metadatas: Vec<Chunk>) -> Result<()>;

    /// Return the top `k` chunks by inner-product similarity against
    /// `query`, best first. An empty store yields an empty sequence.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;
}
