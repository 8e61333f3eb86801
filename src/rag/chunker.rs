//! Deterministic text chunking with overlap.

use crate::types::{AppError, Chunk, Result};

/// Splits raw text into overlapping fixed-size character windows with
/// stable indices.
///
/// Identical `(text, max_chars, overlap)` always yields an identical
/// sequence, which reproducible indexing and the test suite rely on.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] unless `overlap < max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if overlap >= max_chars {
            return Err(AppError::Configuration(format!(
                "overlap ({}) must be smaller than max_chars ({})",
                overlap, max_chars
            )));
        }
        Ok(Self { max_chars, overlap })
    }

    /// Maximum characters per chunk.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Overlap in characters between consecutive chunks.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks.
    ///
    /// Windows are `max_chars` characters long and each window start
    /// advances by `max_chars - overlap`; the final window may be
    /// shorter. Empty text yields an empty sequence.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.max_chars - self.overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.max_chars).min(chars.len());
            chunks.push(Chunk {
                chunk_text: chars[start..end].iter().collect(),
                chunk_index: chunks.len(),
            });
            start += step;
        }

        chunks
    }
}

/// Convenience wrapper: construct a chunker and chunk in one call.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(max_chars, overlap)?.chunk(text))
}
