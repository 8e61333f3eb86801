//! Indexed vector store with directory persistence.
//!
//! Wraps the in-house `chatdoc-vector` flat inner-product index and
//! keeps a parallel chunk array alongside it. Persistence writes two
//! artifacts into one directory; both are required to load, and the
//! directory is wiped and rewritten whole on every save so stale chunks
//! never survive a re-ingestion.

use crate::store::VectorStore;
use crate::types::{AppError, Chunk, Result, ScoredChunk};
use async_trait::async_trait;
use chatdoc_vector::FlatIndex;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Index artifact filename within a persistence directory.
pub const INDEX_FILE: &str = "index.bin";
/// Metadata artifact filename within a persistence directory.
pub const CHUNKS_FILE: &str = "chunks.json";

struct Inner {
    index: FlatIndex,
    chunks: Vec<Chunk>,
}

/// Vector store backed by [`FlatIndex`], with `save`/`load`.
pub struct FlatVectorStore {
    inner: RwLock<Inner>,
}

impl FlatVectorStore {
    /// Create an empty store for vectors of length `dim`.
    pub fn new(dim: usize) -> Result<Self> {
        let index = FlatIndex::new(dim)?;
        Ok(Self {
            inner: RwLock::new(Inner {
                index,
                chunks: Vec::new(),
            }),
        })
    }

    /// Persist the store into `dir`, replacing any previous contents.
    ///
    /// The directory is removed and recreated, then the index and
    /// chunk artifacts are written together.
    pub async fn save(&self, dir: &Path) -> Result<()> {
        let (index, chunks_json) = {
            let inner = self.inner.read();
            let json = serde_json::to_vec(&inner.chunks)
                .map_err(|e| AppError::Internal(format!("failed to serialize chunks: {}", e)))?;
            (inner.index.clone(), json)
        };

        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tokio::fs::create_dir_all(dir).await?;

        chatdoc_vector::save_index(&dir.join(INDEX_FILE), &index).await?;
        tokio::fs::write(dir.join(CHUNKS_FILE), &chunks_json).await?;

        info!(dir = ?dir, vectors = index.ntotal(), "Persisted vector store");
        Ok(())
    }

    /// Load a previously saved store from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::IndexCorrupt`] when either artifact is
    /// missing or unreadable, or when the two disagree in count, and
    /// [`AppError::DimensionMismatch`] when the loaded index's
    /// dimension differs from `expected_dim`.
    pub async fn load(dir: &Path, expected_dim: usize) -> Result<Self> {
        let index = chatdoc_vector::load_index(&dir.join(INDEX_FILE))
            .await
            .map_err(|e| match e {
                chatdoc_vector::Error::Io(io) => {
                    AppError::IndexCorrupt(format!("index artifact unreadable: {}", io))
                }
                other => AppError::from(other),
            })?;

        let chunk_bytes = tokio::fs::read(dir.join(CHUNKS_FILE))
            .await
            .map_err(|e| AppError::IndexCorrupt(format!("chunk artifact unreadable: {}", e)))?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&chunk_bytes)
            .map_err(|e| AppError::IndexCorrupt(format!("chunk artifact invalid: {}", e)))?;

        if chunks.len() != index.ntotal() {
            return Err(AppError::IndexCorrupt(format!(
                "index holds {} vectors but metadata holds {} chunks",
                index.ntotal(),
                chunks.len()
            )));
        }
        if index.dim() != expected_dim {
            return Err(AppError::DimensionMismatch {
                expected: expected_dim,
                actual: index.dim(),
            });
        }

        debug!(dir = ?dir, vectors = index.ntotal(), "Loaded vector store");
        Ok(Self {
            inner: RwLock::new(Inner { index, chunks }),
        })
    }
}

#[async_trait]
impl VectorStore for FlatVectorStore {
    fn name(&self) -> &str {
        "flat"
    }

    fn dim(&self) -> usize {
        self.inner.read().index.dim()
    }

    fn len(&self) -> usize {
        self.inner.read().index.ntotal()
    }

    async fn add(&self, vectors: Vec<Vec<f32>>, metadatas: Vec<Chunk>) -> Result<()> {
        if vectors.len() != metadatas.len() {
            return Err(AppError::DimensionMismatch {
                expected: metadatas.len(),
                actual: vectors.len(),
            });
        }

        let mut inner = self.inner.write();
        // add_batch rejects the whole batch on any bad vector, keeping
        // the index and chunk array in lockstep.
        inner.index.add_batch(vectors.iter().map(Vec::as_slice))?;
        inner.chunks.extend(metadatas);
        debug!(store = "flat", total = inner.index.ntotal(), "Added vectors");
        Ok(())
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let inner = self.inner.read();
        let hits = inner.index.search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                chunk: inner.chunks[hit.id].clone(),
                score: hit.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk {
            chunk_text: text.to_string(),
            chunk_index: index,
        }
    }

    async fn populated_store() -> FlatVectorStore {
        let store = FlatVectorStore::new(3).unwrap();
        store
            .add(
                vec![
                    vec![1.0, 0.0, 0.0],
                    vec![0.0, 1.0, 0.0],
                    vec![0.9, 0.1, 0.0],
                ],
                vec![chunk("alpha", 0), chunk("beta", 1), chunk("gamma", 2)],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_returns_chunks_best_first() {
        let store = populated_store().await;
        let hits = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.chunk_text, "alpha");
        assert_eq!(hits[1].chunk.chunk_text, "gamma");
    }

    #[tokio::test]
    async fn test_save_load_preserves_search_results() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("doc");

        let store = populated_store().await;
        store.save(&dir).await.unwrap();
        let loaded = FlatVectorStore::load(&dir, 3).await.unwrap();

        let original = store.search(&[0.5, 0.5, 0.0], 3).await.unwrap();
        let reloaded = loaded.search(&[0.5, 0.5, 0.0], 3).await.unwrap();
        assert_eq!(original, reloaded);
    }

    #[tokio::test]
    async fn test_save_wipes_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("doc");

        let store = populated_store().await;
        store.save(&dir).await.unwrap();
        tokio::fs::write(dir.join("stale.dat"), b"leftover")
            .await
            .unwrap();

        store.save(&dir).await.unwrap();
        assert!(!dir.join("stale.dat").exists());
        assert!(dir.join(INDEX_FILE).exists());
        assert!(dir.join(CHUNKS_FILE).exists());
    }

    #[tokio::test]
    async fn test_load_missing_directory_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let result = FlatVectorStore::load(&temp_dir.path().join("absent"), 3).await;
        assert!(matches!(result, Err(AppError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn test_load_missing_chunk_artifact_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("doc");

        let store = populated_store().await;
        store.save(&dir).await.unwrap();
        tokio::fs::remove_file(dir.join(CHUNKS_FILE)).await.unwrap();

        let result = FlatVectorStore::load(&dir, 3).await;
        assert!(matches!(result, Err(AppError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn test_load_count_disagreement_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("doc");

        let store = populated_store().await;
        store.save(&dir).await.unwrap();

        let truncated = serde_json::to_vec(&vec![chunk("alpha", 0)]).unwrap();
        tokio::fs::write(dir.join(CHUNKS_FILE), &truncated)
            .await
            .unwrap();

        let result = FlatVectorStore::load(&dir, 3).await;
        assert!(matches!(result, Err(AppError::IndexCorrupt(_))));
    }

    #[tokio::test]
    async fn test_load_dimension_disagreement_fails() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("doc");

        let store = populated_store().await;
        store.save(&dir).await.unwrap();

        let result = FlatVectorStore::load(&dir, 5).await;
        assert!(matches!(
            result,
            Err(AppError::DimensionMismatch {
                expected: 5,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_add_count_mismatch_leaves_store_unchanged() {
        let store = FlatVectorStore::new(3).unwrap();
        let result = store
            .add(vec![vec![1.0, 0.0, 0.0]], vec![chunk("a", 0), chunk("b", 1)])
            .await;

        assert!(matches!(result, Err(AppError::DimensionMismatch { .. })));
        assert!(store.is_empty());
    }
}
