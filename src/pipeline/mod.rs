//! Answer pipeline: composes retrieval, generation, and the grounding
//! gate into one request/response cycle per question.
//!
//! Every answered question produces exactly one query log entry, even
//! on refusal. Only genuine pipeline failures (ingestion errors,
//! unrecoverable load errors, provider unavailability) leave no entry
//! and propagate to the caller.

use crate::llm::{estimate_tokens, GenerationClient};
use crate::rag::chunker::TextChunker;
use crate::rag::embeddings::EmbeddingProvider;
use crate::rag::grounding::{enforce_grounding, GroundingPolicy};
use crate::rag::prompts::{build_prompt, GREETING_TEXT};
use crate::rag::retriever::retrieve_from_store;
use crate::store::{FlatVectorStore, VectorStore};
use crate::types::{AppError, DocumentRecord, QueryLogEntry, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

mod registry;

pub use registry::{decode_document_bytes, DocumentRegistry};

/// Conversational fillers answered without touching the index.
const GREETINGS: &[&str] = &["hi", "hello", "hey", "thanks", "thank you"];

/// Where an incoming question is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionRoute {
    /// Conversational filler: answer with the canned greeting, skip
    /// retrieval and generation entirely.
    Greeting,
    /// Substantive question against a document with no persisted index
    /// yet: ingest synchronously, then answer.
    NeedsIngestion,
    /// Substantive question against an already-ingested document.
    Ready,
}

/// Route a question given the target document's state.
pub fn route_question(question: &str, document: &DocumentRecord) -> QuestionRoute {
    let normalized = question.trim().to_lowercase();
    if GREETINGS.contains(&normalized.as_str()) {
        QuestionRoute::Greeting
    } else if !document.is_processed {
        QuestionRoute::NeedsIngestion
    } else {
        QuestionRoute::Ready
    }
}

/// What to do about a failed index load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadDecision {
    /// Artifacts are missing, corrupt, or stale: rebuild the index
    /// once and try loading again. A second failure is fatal.
    RetryOnce,
    /// Unrelated failure: surface it unchanged.
    Fail,
}

/// Classify a load failure into a retry decision.
pub fn classify_load(err: &AppError) -> LoadDecision {
    match err {
        AppError::IndexCorrupt(_) | AppError::DimensionMismatch { .. } | AppError::Io(_) => {
            LoadDecision::RetryOnce
        }
        _ => LoadDecision::Fail,
    }
}

/// The question-answering pipeline for registered documents.
pub struct QaPipeline {
    registry: Arc<DocumentRegistry>,
    embeddings: Arc<dyn EmbeddingProvider>,
    generator: Option<Arc<dyn GenerationClient>>,
    chunker: TextChunker,
    index_root: PathBuf,
    top_k: usize,
    policy: GroundingPolicy,
}

impl QaPipeline {
    /// Assemble a pipeline from its parts.
    ///
    /// `generator` may be absent: ingestion works without one, and
    /// answering then fails with
    /// [`AppError::ProviderUnavailable`](crate::types::AppError).
    pub fn new(
        registry: Arc<DocumentRegistry>,
        embeddings: Arc<dyn EmbeddingProvider>,
        generator: Option<Arc<dyn GenerationClient>>,
        chunker: TextChunker,
        index_root: impl Into<PathBuf>,
        top_k: usize,
        policy: GroundingPolicy,
    ) -> Self {
        Self {
            registry,
            embeddings,
            generator,
            chunker,
            index_root: index_root.into(),
            top_k,
            policy,
        }
    }

    /// The document registry behind this pipeline.
    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    /// Persistence directory for one document's index.
    pub fn index_dir(&self, id: Uuid) -> PathBuf {
        self.index_root.join(format!("document_{}", id))
    }

    /// Ingest a document: chunk, embed, index, persist, mark processed.
    ///
    /// Serialized per document; a document that is already processed is
    /// left untouched. On error the document's state is unchanged.
    pub async fn ingest(&self, id: Uuid) -> Result<()> {
        let lock = self.registry.ingest_lock(id);
        let _guard = lock.lock().await;

        let record = self.registry.get(id)?;
        if record.is_processed {
            return Ok(());
        }
        self.run_ingestion(&record).await
    }

    /// Answer a question against a document, recording one query log
    /// entry on success.
    pub async fn answer(&self, id: Uuid, question: &str) -> Result<QueryLogEntry> {
        let record = self.registry.get(id)?;
        if route_question(question, &record) == QuestionRoute::Greeting {
            return Ok(self.log_greeting(id, question));
        }

        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::ProviderUnavailable("no generation backend configured".into())
        })?;

        let started = Instant::now();

        // Ingestion-if-needed and load share the per-document lock so a
        // rebuild never races a concurrent request's load.
        let store = {
            let lock = self.registry.ingest_lock(id);
            let _guard = lock.lock().await;

            let record = self.registry.get(id)?;
            if route_question(question, &record) == QuestionRoute::NeedsIngestion {
                self.run_ingestion(&record).await?;
            }
            self.load_store_with_retry(&record).await?
        };

        let (context, citations) =
            retrieve_from_store(question, self.embeddings.as_ref(), &store, self.top_k).await?;

        let generation = generator.generate(&build_prompt(&context, question)).await?;
        let answer = enforce_grounding(&generation.text, &citations, &self.policy);

        let latency_ms = started.elapsed().as_millis() as u64;
        let tokens_used = Some(
            generation
                .tokens_used
                .unwrap_or_else(|| estimate_tokens(&generation.text)),
        );

        let entry = QueryLogEntry {
            question: question.to_string(),
            answer,
            latency_ms,
            tokens_used,
            citations: citations.into_iter().map(|c| c.chunk).collect(),
            created_at: Utc::now(),
        };
        self.registry.append_log(id, entry.clone());
        info!(document = %id, latency_ms, "Answered question");
        Ok(entry)
    }

    fn log_greeting(&self, id: Uuid, question: &str) -> QueryLogEntry {
        let entry = QueryLogEntry {
            question: question.to_string(),
            answer: GREETING_TEXT.to_string(),
            latency_ms: 0,
            tokens_used: Some(0),
            citations: Vec::new(),
            created_at: Utc::now(),
        };
        self.registry.append_log(id, entry.clone());
        entry
    }

    async fn run_ingestion(&self, record: &DocumentRecord) -> Result<()> {
        if record.text.trim().is_empty() {
            return Err(AppError::Ingestion(format!(
                "document {:?} holds no text",
                record.filename
            )));
        }

        let chunks = self.chunker.chunk(&record.text);
        if chunks.is_empty() {
            return Err(AppError::Ingestion(format!(
                "document {:?} produced no chunks",
                record.filename
            )));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.chunk_text.clone()).collect();
        let vectors = self.embeddings.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(AppError::Ingestion(format!(
                "embedded {} of {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let chunk_count = chunks.len();
        let store = FlatVectorStore::new(self.embeddings.dim())?;
        store.add(vectors, chunks).await?;
        store.save(&self.index_dir(record.id)).await?;

        self.registry.mark_processed(record.id)?;
        info!(document = %record.id, chunks = chunk_count, "Ingested document");
        Ok(())
    }

    async fn load_store_with_retry(&self, record: &DocumentRecord) -> Result<FlatVectorStore> {
        let dir = self.index_dir(record.id);
        let dim = self.embeddings.dim();

        match FlatVectorStore::load(&dir, dim).await {
            Ok(store) => Ok(store),
            Err(err) => match classify_load(&err) {
                LoadDecision::Fail => Err(err),
                LoadDecision::RetryOnce => {
                    warn!(document = %record.id, error = %err, "Index load failed, rebuilding once");
                    self.run_ingestion(record).await?;
                    // Exactly one retry: a failure here propagates.
                    FlatVectorStore::load(&dir, dim).await
                }
            },
        }
    }
}
