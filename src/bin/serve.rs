//! Chat assistant server: binds the HTTP router over the knowledge store.

use std::sync::Arc;

use dronemind::completion::OpenAiChatModel;
use dronemind::config::Settings;
use dronemind::embedding::OpenAiEmbedder;
use dronemind::query::{ChatService, RetrievalConfig};
use dronemind::server;
use dronemind::stores::SqliteChunkStore;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::from_env()?;

    let embedder = OpenAiEmbedder::new(
        &settings.model_api_key,
        &settings.model_api_base,
        &settings.embedding_model,
        settings.embedding_dimensions,
    )?;
    let store = SqliteChunkStore::open(&settings.database_path, &embedder).await?;
    let chat_model = OpenAiChatModel::new(
        &settings.model_api_key,
        &settings.model_api_base,
        &settings.chat_model,
    );
    let service = Arc::new(ChatService::new(
        embedder,
        store,
        chat_model,
        RetrievalConfig {
            match_threshold: settings.match_threshold,
            match_count: settings.match_count,
        },
    ));

    let router = server::router(service);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(
        addr = %settings.bind_addr,
        db = %settings.database_path.display(),
        "serving chat assistant"
    );
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
