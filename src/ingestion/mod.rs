//! Offline ingestion: turning vendor specification pages into stored,
//! embedded chunks.
//!
//! * [`fetch`] — page retrieval with retry, spec-text extraction, and
//!   model-name derivation.
//! * [`pipeline`] — the fetch → chunk → embed → store orchestration.

pub mod fetch;
pub mod pipeline;

pub use fetch::{PageFetcher, UNKNOWN_MODEL, extract_model_name, extract_spec_text};
pub use pipeline::{IngestReport, IngestionPipeline, UrlFailure};
