//! Offline knowledge refresh: scrape the vendor spec pages, chunk, embed,
//! and persist into the SQLite knowledge store.
//!
//! Pages come from `INGEST_URLS` (comma-separated) or the built-in list.
//! Each run replaces a URL's previous rows, so re-running is safe.

use std::env;
use std::time::Instant;

use dronemind::chunker::{Chunker, DEFAULT_SEPARATORS};
use dronemind::config::Settings;
use dronemind::embedding::OpenAiEmbedder;
use dronemind::ingestion::{IngestionPipeline, PageFetcher};
use dronemind::stores::SqliteChunkStore;
use tracing_subscriber::EnvFilter;

const DEFAULT_URLS: &[&str] = &[
    "https://www.dji.com/cn/mavic-4-pro/specs",
    "https://www.dji.com/cn/mini-4-pro/specs",
    "https://www.dji.com/cn/air-3s/specs",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env()?;
    let urls: Vec<String> = match env::var("INGEST_URLS") {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => DEFAULT_URLS.iter().map(|url| url.to_string()).collect(),
    };

    let embedder = OpenAiEmbedder::new(
        &settings.model_api_key,
        &settings.model_api_base,
        &settings.embedding_model,
        settings.embedding_dimensions,
    )?;
    let store = SqliteChunkStore::open(&settings.database_path, &embedder).await?;
    let fetcher = PageFetcher::new(settings.fetch_timeout, settings.fetch_max_attempts)?;
    let chunker = Chunker::new(
        settings.chunk_max_size,
        settings.chunk_overlap,
        DEFAULT_SEPARATORS,
    )?;
    let pipeline = IngestionPipeline::new(fetcher, chunker, embedder, store);

    println!("Refreshing knowledge store from {} pages", urls.len());
    let start = Instant::now();
    let report = pipeline.run(&urls).await;
    let duration = start.elapsed();

    println!("\nIngestion complete");
    println!("  pages processed : {}", report.pages_processed);
    println!("  pages failed    : {}", report.pages_failed);
    println!("  chunks written  : {}", report.chunks_written);
    println!("  chunks skipped  : {}", report.chunks_skipped);
    println!("  duration        : {:.1}s", duration.as_secs_f64());
    println!("  sqlite database : {}", settings.database_path.display());
    for failure in &report.failures {
        eprintln!("  failed {}: {}", failure.url, failure.error);
    }

    if report.chunks_written == 0 {
        return Err("no chunks were ingested".into());
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
