//! Fetch → chunk → embed → store orchestration.

use chrono::Utc;
use rig::embeddings::EmbeddingModel;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::fetch::{PageFetcher, extract_model_name};
use crate::chunker::Chunker;
use crate::stores::{ChunkRecord, KnowledgeStore};
use crate::types::AssistantError;

/// Outcome of one ingestion run.
///
/// A URL whose fetch exhausts its retries lands in `failures` and does not
/// abort the run; a chunk whose embedding or write fails is counted in
/// `chunks_skipped` and does not abort its page.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub pages_processed: usize,
    pub pages_failed: usize,
    pub chunks_written: usize,
    pub chunks_skipped: usize,
    pub failures: Vec<UrlFailure>,
}

/// A URL the run could not ingest at all.
#[derive(Debug)]
pub struct UrlFailure {
    pub url: String,
    pub error: String,
}

#[derive(Default)]
struct PageOutcome {
    written: usize,
    skipped: usize,
}

/// The offline ingestion pipeline. Designed for one run at a time; nothing
/// guards concurrent runs against each other.
pub struct IngestionPipeline<E, S> {
    fetcher: PageFetcher,
    chunker: Chunker,
    embedder: E,
    store: S,
}

impl<E, S> IngestionPipeline<E, S>
where
    E: EmbeddingModel + Clone + Send + Sync,
    S: KnowledgeStore,
{
    pub fn new(fetcher: PageFetcher, chunker: Chunker, embedder: E, store: S) -> Self {
        Self {
            fetcher,
            chunker,
            embedder,
            store,
        }
    }

    /// Ingests every URL in order and reports what happened.
    pub async fn run(&self, urls: &[String]) -> IngestReport {
        let mut report = IngestReport::default();
        for url in urls {
            info!(%url, "ingesting page");
            match self.ingest_page(url).await {
                Ok(outcome) => {
                    report.pages_processed += 1;
                    report.chunks_written += outcome.written;
                    report.chunks_skipped += outcome.skipped;
                    info!(
                        %url,
                        written = outcome.written,
                        skipped = outcome.skipped,
                        "page ingested"
                    );
                }
                Err(err) => {
                    error!(%url, %err, "page ingestion failed");
                    report.pages_failed += 1;
                    report.failures.push(UrlFailure {
                        url: url.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        report
    }

    async fn ingest_page(&self, url: &str) -> Result<PageOutcome, AssistantError> {
        let text = self.fetcher.fetch_spec_text(url).await?;
        let model_name = extract_model_name(url);
        let chunks = self.chunker.split(&text);
        if chunks.is_empty() {
            warn!(%url, "page produced no spec text");
        }
        let date_updated = Utc::now().to_rfc3339();

        // A refresh replaces the URL's previous rows; stale duplicates would
        // otherwise compete with fresh rows for the top-K slots.
        let removed = self.store.delete_chunks_by_url(url).await?;
        if removed > 0 {
            debug!(%url, removed, "replaced rows from a previous run");
        }

        let mut outcome = PageOutcome::default();
        for (chunk_index, content) in chunks.into_iter().enumerate() {
            match self
                .store_chunk(url, &model_name, &date_updated, chunk_index, content)
                .await
            {
                Ok(()) => outcome.written += 1,
                Err(err) => {
                    warn!(%url, chunk_index, %err, "skipping chunk");
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn store_chunk(
        &self,
        url: &str,
        model_name: &str,
        date_updated: &str,
        chunk_index: usize,
        content: String,
    ) -> Result<(), AssistantError> {
        let embedding = self
            .embedder
            .embed_texts(vec![content.clone()])
            .await
            .map_err(|err| AssistantError::Embedding(err.to_string()))?
            .pop()
            .ok_or_else(|| {
                AssistantError::Embedding("embedding service returned no vector".to_string())
            })?;
        let vector: Vec<f32> = embedding.vec.iter().map(|v| *v as f32).collect();

        let record = ChunkRecord {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            model_name: model_name.to_string(),
            date_updated: date_updated.to_string(),
            chunk_index,
            content,
            embedding: Some(vector),
        };
        self.store.insert_chunks(vec![record]).await
    }
}
