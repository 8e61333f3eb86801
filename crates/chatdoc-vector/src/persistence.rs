//! Persistence layer for chatdoc-vector.
//!
//! The index is serialized to a single binary artifact (postcard
//! format) that is always written and read whole.

use crate::error::{Error, Result};
use crate::FlatIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// On-disk representation of a [`FlatIndex`].
#[derive(Debug, Serialize, Deserialize)]
struct IndexArtifact {
    dim: u64,
    count: u64,
    data: Vec<f32>,
}

/// Save an index to the given file path.
///
/// The parent directory must already exist.
pub async fn save_index(path: &Path, index: &FlatIndex) -> Result<()> {
    let artifact = IndexArtifact {
        dim: index.dim() as u64,
        count: index.ntotal() as u64,
        data: index.raw_data().to_vec(),
    };

    let bytes = postcard::to_allocvec(&artifact)
        .map_err(|e| Error::Persistence(format!("Failed to serialize index: {}", e)))?;
    tokio::fs::write(path, &bytes).await?;

    info!(path = ?path, vectors = index.ntotal(), dim = index.dim(), "Saved index artifact");
    Ok(())
}

/// Load an index from the given file path.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and
/// [`Error::Corrupt`] if the artifact does not decode or its recorded
/// count disagrees with the stored data.
pub async fn load_index(path: &Path) -> Result<FlatIndex> {
    let bytes = tokio::fs::read(path).await?;

    let artifact: IndexArtifact = postcard::from_bytes(&bytes)
        .map_err(|e| Error::Corrupt(format!("Failed to decode index artifact: {}", e)))?;

    let dim = artifact.dim as usize;
    let count = artifact.count as usize;
    if artifact.data.len() != dim.saturating_mul(count) {
        return Err(Error::Corrupt(format!(
            "artifact records {} vectors of dim {} but holds {} values",
            count,
            dim,
            artifact.data.len()
        )));
    }

    let index = FlatIndex::from_parts(dim, artifact.data)?;
    debug!(path = ?path, vectors = count, dim, "Loaded index artifact");
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.bin");

        let mut index = FlatIndex::new(3).unwrap();
        index.add(&[1.0, 2.0, 3.0]).unwrap();
        index.add(&[4.0, 5.0, 6.0]).unwrap();

        save_index(&path, &index).await.unwrap();
        let loaded = load_index(&path).await.unwrap();

        assert_eq!(loaded, index);

        let original = index.search(&[1.0, 0.0, 0.0], 2).unwrap();
        let reloaded = loaded.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(original, reloaded);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_index(&temp_dir.path().join("missing.bin")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_load_garbage_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.bin");
        tokio::fs::write(&path, b"not an index artifact at all")
            .await
            .unwrap();

        let result = load_index(&path).await;
        assert!(matches!(result, Err(Error::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_load_inconsistent_count_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.bin");

        let artifact = IndexArtifact {
            dim: 3,
            count: 5,
            data: vec![0.0; 6],
        };
        let bytes = postcard::to_allocvec(&artifact).unwrap();
        tokio::fs::write(&path, &bytes).await.unwrap();

        let result = load_index(&path).await;
        assert!(matches!(result, Err(Error::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_save_empty_index() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.bin");

        let index = FlatIndex::new(4).unwrap();
        save_index(&path, &index).await.unwrap();

        let loaded = load_index(&path).await.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dim(), 4);
    }
}
