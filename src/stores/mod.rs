//! Storage backends for chunk documents and their embeddings.
//!
//! The [`KnowledgeStore`] trait abstracts over storage implementations so the
//! pipelines can run against test doubles; the shipped backend is
//! [`sqlite::SqliteChunkStore`] (SQLite with vector search via `sqlite-vec`).

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::AssistantError;

pub use sqlite::{ChunkDocument, SqliteChunkStore};

/// A chunk with provenance metadata and (optionally) its embedding, ready
/// for storage. Records without an embedding cannot participate in vector
/// search and are skipped on insert.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this chunk.
    pub id: String,
    /// Source page URL.
    pub url: String,
    /// Product model identifier derived from the URL; `"unknown"` when the
    /// URL carries no usable path segment.
    pub model_name: String,
    /// RFC 3339 timestamp of the ingestion run that produced this row.
    pub date_updated: String,
    /// Zero-based index of this chunk within the source page.
    pub chunk_index: usize,
    /// The chunk text.
    pub content: String,
    /// The embedding vector (if computed).
    pub embedding: Option<Vec<f32>>,
}

impl ChunkRecord {
    /// Sets the embedding vector.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

/// A row returned from a similarity query, validated at the store boundary.
/// Malformed rows fail the query instead of propagating missing fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedChunk {
    pub content: String,
    pub url: String,
    pub model_name: String,
    /// Freshness marker surfaced to the end user; absent for rows ingested
    /// before the column existed.
    pub date_updated: Option<String>,
    /// Cosine similarity to the query vector, in [-1, 1].
    pub similarity: f32,
}

/// Unified interface for chunk storage backends.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Inserts chunk records. Records lacking an embedding are skipped.
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), AssistantError>;

    /// Retrieves all chunks for a given source URL, ordered by chunk index.
    async fn get_chunks_by_url(&self, url: &str) -> Result<Vec<ChunkRecord>, AssistantError>;

    /// Deletes all chunks for a given source URL; returns the removed count.
    async fn delete_chunks_by_url(&self, url: &str) -> Result<usize, AssistantError>;

    /// Returns up to `match_count` chunks whose cosine similarity to
    /// `query_embedding` is at least `match_threshold`, most similar first.
    /// Zero matches is not an error.
    async fn search_similar(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>, AssistantError>;

    /// Total number of chunks in the store.
    async fn count(&self) -> Result<usize, AssistantError>;
}
