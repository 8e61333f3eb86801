//! In-memory document registry and query log.

use crate::types::{AppError, DocumentRecord, QueryLogEntry, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Decode raw document bytes as UTF-8, dropping invalid sequences.
///
/// Never fails: arbitrarily malformed input decodes to whatever valid
/// UTF-8 it contains, possibly the empty string.
pub fn decode_document_bytes(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(err) => {
                let valid_len = err.valid_up_to();
                if let Ok(valid) = std::str::from_utf8(&rest[..valid_len]) {
                    text.push_str(valid);
                }
                let skip = err.error_len().unwrap_or(rest.len() - valid_len);
                rest = &rest[valid_len + skip..];
            }
        }
    }
}

/// Tracks uploaded documents, their query logs, and one ingestion lock
/// per document.
///
/// The lock serializes ingestion/answer cycles for a single document;
/// different documents proceed independently.
#[derive(Default)]
pub struct DocumentRegistry {
    documents: RwLock<HashMap<Uuid, DocumentRecord>>,
    query_logs: RwLock<HashMap<Uuid, Vec<QueryLogEntry>>>,
    ingest_locks: parking_lot::Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl DocumentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new document from raw bytes.
    pub fn register(&self, filename: &str, bytes: &[u8]) -> DocumentRecord {
        self.register_with_id(Uuid::new_v4(), filename, bytes)
    }

    /// Register a document under a caller-chosen id.
    ///
    /// Lets callers derive a stable id (e.g. from a file path) so the
    /// same document maps to the same index directory across runs.
    pub fn register_with_id(&self, id: Uuid, filename: &str, bytes: &[u8]) -> DocumentRecord {
        let record = DocumentRecord {
            id,
            filename: filename.to_string(),
            text: decode_document_bytes(bytes),
            is_processed: false,
            uploaded_at: Utc::now(),
        };
        info!(id = %record.id, filename = %record.filename, bytes = bytes.len(), "Registered document");

        self.documents.write().insert(record.id, record.clone());
        record
    }

    /// Fetch a document by id.
    pub fn get(&self, id: Uuid) -> Result<DocumentRecord> {
        self.documents
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("document {}", id)))
    }

    /// Flip a document's processed flag to true.
    pub fn mark_processed(&self, id: Uuid) -> Result<()> {
        let mut documents = self.documents.write();
        let record = documents
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("document {}", id)))?;
        record.is_processed = true;
        Ok(())
    }

    /// Append one query log entry for a document.
    pub fn append_log(&self, id: Uuid, entry: QueryLogEntry) {
        self.query_logs.write().entry(id).or_default().push(entry);
    }

    /// All log entries recorded for a document, oldest first.
    pub fn logs(&self, id: Uuid) -> Vec<QueryLogEntry> {
        self.query_logs.read().get(&id).cloned().unwrap_or_default()
    }

    /// The ingestion lock for a document, created on first use.
    pub fn ingest_lock(&self, id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        self.ingest_locks
            .lock()
            .entry(id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
