//! Retrieval orchestration: chunk, embed, index, search, assemble.

use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingProvider;
use crate::store::{MemoryVectorStore, VectorStore};
use crate::types::{Result, ScoredChunk};
use tracing::debug;

/// Join citation texts with a blank line, in citation order.
pub fn assemble_context(citations: &[ScoredChunk]) -> String {
    citations
        .iter()
        .map(|c| c.chunk.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Retrieve against an already-populated store.
///
/// Returns the assembled context string and the backing citations,
/// similarity-descending. An empty result is `("", [])` — the signal
/// for "no evidence", which downstream turns into a refusal.
pub async fn retrieve_from_store(
    question: &str,
    provider: &dyn EmbeddingProvider,
    store: &dyn VectorStore,
    k: usize,
) -> Result<(String, Vec<ScoredChunk>)> {
    if store.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let query = provider.embed(&[question.to_string()]).await?;
    let Some(query_vector) = query.first() else {
        return Ok((String::new(), Vec::new()));
    };

    let citations = store.search(query_vector, k).await?;
    debug!(citations = citations.len(), k, "Retrieved citations");

    let context = assemble_context(&citations);
    Ok((context, citations))
}

/// Retrieve against raw document text.
///
/// Chunks the text, embeds the chunks into a fresh ephemeral store,
/// then searches it with the embedded question. Text that produces no
/// chunks yields `("", [])`.
pub async fn retrieve_context(
    document_text: &str,
    question: &str,
    provider: &dyn EmbeddingProvider,
    chunker: &TextChunker,
    k: usize,
) -> Result<(String, Vec<ScoredChunk>)> {
    let chunks = chunker.chunk(document_text);
    if chunks.is_empty() {
        return Ok((String::new(), Vec::new()));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.chunk_text.clone()).collect();
    let vectors = provider.embed(&texts).await?;

    let store = MemoryVectorStore::new(provider.dim())?;
    store.add(vectors, chunks).await?;

    retrieve_from_store(question, provider, &store, k).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::DeterministicEmbeddingProvider;
    use crate::types::Chunk;

    fn scored(text: &str, index: usize, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                chunk_text: text.to_string(),
                chunk_index: index,
            },
            score,
        }
    }

    #[test]
    fn test_context_joins_with_blank_line() {
        let citations = vec![scored("first", 0, 2.0), scored("second", 1, 1.0)];
        assert_eq!(assemble_context(&citations), "first\n\nsecond");
    }

    #[test]
    fn test_empty_citations_yield_empty_context() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[tokio::test]
    async fn test_empty_document_is_no_evidence() {
        let provider = DeterministicEmbeddingProvider::new();
        let chunker = TextChunker::new(100, 10).unwrap();

        let (context, citations) = retrieve_context("", "anything?", &provider, &chunker, 3)
            .await
            .unwrap();

        assert_eq!(context, "");
        assert!(citations.is_empty());
    }

    #[tokio::test]
    async fn test_empty_store_is_no_evidence() {
        let provider = DeterministicEmbeddingProvider::new();
        let store = MemoryVectorStore::new(provider.dim()).unwrap();

        let (context, citations) = retrieve_from_store("anything?", &provider, &store, 3)
            .await
            .unwrap();

        assert_eq!(context, "");
        assert!(citations.is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_returns_at_most_k_citations() {
        let provider = DeterministicEmbeddingProvider::new();
        let chunker = TextChunker::new(20, 5).unwrap();
        let text = "the quick brown fox jumps over the lazy dog and keeps on running far away";

        let (context, citations) = retrieve_context(text, "fox?", &provider, &chunker, 2)
            .await
            .unwrap();

        assert!(citations.len() <= 2);
        assert!(!context.is_empty());
        assert_eq!(context, assemble_context(&citations));
    }

    #[tokio::test]
    async fn test_citations_are_similarity_descending() {
        let provider = DeterministicEmbeddingProvider::new();
        let chunker = TextChunker::new(50, 10).unwrap();
        let text = "a".repeat(200);

        let (_, citations) = retrieve_context(&text, "query", &provider, &chunker, 5)
            .await
            .unwrap();

        for pair in citations.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
