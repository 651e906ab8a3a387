//! Retrieval-augmented chat assistant for drone technical specifications.
//!
//! ```text
//! Offline refresh (ingest binary)
//! vendor URLs ──► ingestion::PageFetcher ──► chunker::Chunker ──► embedding
//!                                                                   │
//!                                        stores::SqliteChunkStore ◄─┘
//!
//! Online request (serve binary)
//! question ──► query::normalize ──► embedding ──► stores (top-K similarity)
//!                                                     │
//! SSE tokens ◄── completion::ChatModel ◄── query::prompt ◄───┘
//! ```
//!
//! The two paths share the embedding model and the chunk schema but do not
//! otherwise interact: ingestion writes the knowledge store, the query
//! service only reads it.

pub mod chunker;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod ingestion;
pub mod message;
pub mod query;
pub mod retry;
pub mod server;
pub mod stores;
pub mod types;

pub use types::AssistantError;
