//! Linear-scan in-memory vector store.

use crate::store::VectorStore;
use crate::types::{AppError, Chunk, Result, ScoredChunk};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

/// Ephemeral store scanning every vector on each search.
///
/// O(n·d) per query, no persistence. Intended for small per-request
/// corpora and for tests.
pub struct MemoryVectorStore {
    dim: usize,
    entries: RwLock<Vec<(Vec<f32>, Chunk)>>,
}

impl MemoryVectorStore {
    /// Create an empty store for vectors of length `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(AppError::Configuration(
                "vector store dimension must be non-zero".into(),
            ));
        }
        Ok(Self {
            dim,
            entries: RwLock::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }

    async fn add(&self, vectors: Vec<Vec<f32>>, metadatas: Vec<Chunk>) -> Result<()> {
        if vectors.len() != metadatas.len() {
            return Err(AppError::DimensionMismatch {
                expected: metadatas.len(),
                actual: vectors.len(),
            });
        }
        for vector in &vectors {
            if vector.len() != self.dim {
                return Err(AppError::DimensionMismatch {
                    expected: self.dim,
                    actual: vector.len(),
                });
            }
        }

        let mut entries = self.entries.write();
        entries.extend(vectors.into_iter().zip(metadatas));
        debug!(store = "memory", total = entries.len(), "Added vectors");
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dim {
            return Err(AppError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }

        let entries = self.entries.read();
        if entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<ScoredChunk> = entries
            .iter()
            .map(|(vector, chunk)| ScoredChunk {
                chunk: chunk.clone(),
                score: vector.iter().zip(query).map(|(a, b)| a * b).sum(),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk {
            chunk_text: text.to_string(),
            chunk_index: index,
        }
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty() {
        let store = MemoryVectorStore::new(3).unwrap();
        let hits = store.search(&[1.0, 0.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_ranks_by_inner_product() {
        let store = MemoryVectorStore::new(2).unwrap();
        store
            .add(
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
                vec![chunk("x", 0), chunk("y", 1), chunk("mid", 2)],
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.chunk_text, "x");
        assert_eq!(hits[1].chunk.chunk_text, "mid");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn test_ties_prefer_earlier_insertion() {
        let store = MemoryVectorStore::new(2).unwrap();
        store
            .add(
                vec![vec![1.0, 0.0], vec![1.0, 0.0]],
                vec![chunk("first", 0), chunk("second", 1)],
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].chunk.chunk_text, "first");
        assert_eq!(hits[1].chunk.chunk_text, "second");
    }

    #[tokio::test]
    async fn test_k_larger_than_store_returns_all() {
        let store = MemoryVectorStore::new(2).unwrap();
        store
            .add(vec![vec![1.0, 0.0]], vec![chunk("only", 0)])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_add_count_mismatch_fails() {
        let store = MemoryVectorStore::new(2).unwrap();
        let result = store
            .add(vec![vec![1.0, 0.0]], vec![chunk("a", 0), chunk("b", 1)])
            .await;
        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_add_wrong_dimension_fails() {
        let store = MemoryVectorStore::new(3).unwrap();
        let result = store.add(vec![vec![1.0, 0.0]], vec![chunk("a", 0)]).await;
        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
        assert!(store.is_empty());
    }
}
