//! # chatdoc-vector
//!
//! A pure-Rust flat vector index with exact inner-product search and
//! disk persistence.
//!
//! ## Features
//!
//! - **Pure Rust**: No native dependencies, compiles anywhere Rust does
//! - **Exact search**: Every query scans every stored vector, so results
//!   are fully deterministic (ties broken by insertion order)
//! - **Append-only**: Sequential internal ids assigned in insertion
//!   order, never reused
//! - **Persistence**: Single binary artifact, written and read whole
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatdoc_vector::FlatIndex;
//!
//! let mut index = FlatIndex::new(5)?;
//! index.add(&[1.0, 0.0, 0.0, 0.0, 0.0])?;
//! index.add(&[0.0, 1.0, 0.0, 0.0, 0.0])?;
//!
//! let hits = index.search(&[1.0, 0.0, 0.0, 0.0, 0.0], 10)?;
//! assert_eq!(hits[0].id, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod persistence;

pub use error::{Error, Result};
pub use persistence::{load_index, save_index};

use tracing::debug;

/// A single search hit: the internal id of a stored vector and its
/// inner-product score against the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Sequential id assigned at insertion (0-based).
    pub id: usize,
    /// Inner product of the stored vector with the query.
    pub score: f32,
}

/// An append-only flat index over fixed-dimension f32 vectors.
///
/// Vectors are stored contiguously in insertion order. Search computes
/// the inner product against every stored vector and returns the top-k
/// hits ranked descending by score; equal scores preserve insertion
/// order, so identical inputs always produce identical output.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    /// Flattened row-major vector data, `ntotal * dim` entries.
    data: Vec<f32>,
}

impl FlatIndex {
    /// Create an empty index for vectors of the given dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `dim` is zero.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Configuration(
                "index dimension must be non-zero".into(),
            ));
        }
        Ok(Self {
            dim,
            data: Vec::new(),
        })
    }

    /// Rebuild an index from persisted parts.
    pub(crate) fn from_parts(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Corrupt("persisted dimension is zero".into()));
        }
        if data.len() % dim != 0 {
            return Err(Error::Corrupt(format!(
                "vector data length {} is not a multiple of dimension {}",
                data.len(),
                dim
            )));
        }
        Ok(Self { dim, data })
    }

    /// The dimension every stored vector must have.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of vectors currently stored.
    pub fn ntotal(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Whether the index holds no vectors.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the stored vector with the given id.
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dim)?;
        self.data.get(start..start + self.dim)
    }

    pub(crate) fn raw_data(&self) -> &[f32] {
        &self.data
    }

    /// Append one vector, returning its sequential id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the vector's length does
    /// not equal the index dimension, or [`Error::InvalidVector`] if it
    /// contains a non-finite component.
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidVector(
                "vector contains a non-finite component".into(),
            ));
        }

        let id = self.ntotal();
        self.data.extend_from_slice(vector);
        Ok(id)
    }

    /// Append multiple vectors, preserving iteration order.
    ///
    /// # Returns
    ///
    /// The number of vectors added. Fails atomically on the first
    /// invalid vector: previously added vectors from earlier calls stay,
    /// vectors from this call are rolled back.
    pub fn add_batch<'a, I>(&mut self, vectors: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let checkpoint = self.data.len();
        let mut count = 0;
        for vector in vectors {
            if let Err(e) = self.add(vector) {
                self.data.truncate(checkpoint);
                return Err(e);
            }
            count += 1;
        }
        Ok(count)
    }

    /// Exact top-k inner-product search.
    ///
    /// Returns up to `k` hits ranked descending by score; fewer if the
    /// index holds fewer than `k` vectors, and an empty vec for an empty
    /// index. Ties keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the query's length does
    /// not equal the index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Hit> = self
            .data
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, row)| Hit {
                id,
                score: inner_product(row, query),
            })
            .collect();

        // Stable sort keeps insertion order for equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);

        debug!(k, returned = hits.len(), "Flat index search completed");
        Ok(hits)
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
