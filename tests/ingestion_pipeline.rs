//! End-to-end ingestion over a mocked vendor page into a temporary store.

use std::time::Duration;

use dronemind::chunker::Chunker;
use dronemind::embedding::MockEmbedder;
use dronemind::ingestion::{IngestionPipeline, PageFetcher};
use dronemind::retry::RetryPolicy;
use dronemind::stores::{KnowledgeStore, SqliteChunkStore};
use httpmock::prelude::*;
use tempfile::tempdir;

/// A fake spec page with a bit over 1000 characters of body text.
fn fake_spec_page() -> String {
    let sentence = "Maximum flight time 51 minutes in windless conditions. ";
    format!("<html><body>{}</body></html>", sentence.repeat(20))
}

fn fast_fetcher() -> PageFetcher {
    PageFetcher::new(Duration::from_secs(5), 3)
        .unwrap()
        .with_retry_policy(RetryPolicy::linear(3, Duration::ZERO))
}

async fn open_store(dir: &tempfile::TempDir) -> SqliteChunkStore<MockEmbedder> {
    SqliteChunkStore::open(dir.path().join("chunks.sqlite"), &MockEmbedder::new(8))
        .await
        .unwrap()
}

#[tokio::test]
async fn thousand_character_page_is_chunked_embedded_and_stored() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cn/mavic-4-pro/specs");
            then.status(200).body(fake_spec_page());
        })
        .await;

    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let pipeline = IngestionPipeline::new(
        fast_fetcher(),
        Chunker::default(),
        MockEmbedder::new(8),
        store.clone(),
    );

    let url = server.url("/cn/mavic-4-pro/specs");
    let report = pipeline.run(std::slice::from_ref(&url)).await;

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.pages_failed, 0);
    assert!(report.chunks_written >= 2, "1000 chars must span chunks");
    assert_eq!(report.chunks_skipped, 0);
    assert!(report.failures.is_empty());

    let rows = store.get_chunks_by_url(&url).await.unwrap();
    assert_eq!(rows.len(), report.chunks_written);
    for (index, row) in rows.iter().enumerate() {
        assert!(row.content.chars().count() <= 512);
        assert_eq!(row.model_name, "mavic-4-pro");
        assert_eq!(row.chunk_index, index);
        assert!(!row.date_updated.is_empty());
    }
}

#[tokio::test]
async fn reingesting_a_url_replaces_its_rows() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cn/air-3s/specs");
            then.status(200).body(fake_spec_page());
        })
        .await;

    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let pipeline = IngestionPipeline::new(
        fast_fetcher(),
        Chunker::default(),
        MockEmbedder::new(8),
        store.clone(),
    );

    let urls = vec![server.url("/cn/air-3s/specs")];
    let first = pipeline.run(&urls).await;
    let after_first = store.count().await.unwrap();
    let second = pipeline.run(&urls).await;

    assert_eq!(first.chunks_written, second.chunks_written);
    assert_eq!(store.count().await.unwrap(), after_first);
}

#[tokio::test]
async fn exhausted_fetch_is_reported_and_the_run_continues() {
    let server = MockServer::start_async().await;
    let broken = server
        .mock_async(|when, then| {
            when.method(GET).path("/cn/mini-4-pro/specs");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cn/air-3s/specs");
            then.status(200).body(fake_spec_page());
        })
        .await;

    let dir = tempdir().unwrap();
    let store = open_store(&dir).await;
    let pipeline = IngestionPipeline::new(
        fast_fetcher(),
        Chunker::default(),
        MockEmbedder::new(8),
        store.clone(),
    );

    let broken_url = server.url("/cn/mini-4-pro/specs");
    let good_url = server.url("/cn/air-3s/specs");
    let report = pipeline
        .run(&[broken_url.clone(), good_url.clone()])
        .await;

    // Exactly the attempt budget, no more.
    assert_eq!(broken.hits_async().await, 3);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].url, broken_url);

    // The broken page must not take the rest of the refresh down with it.
    assert_eq!(report.pages_processed, 1);
    assert!(report.chunks_written >= 2);
    assert!(store.get_chunks_by_url(&broken_url).await.unwrap().is_empty());
    assert!(!store.get_chunks_by_url(&good_url).await.unwrap().is_empty());
}
