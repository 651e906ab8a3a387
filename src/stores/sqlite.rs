//! SQLite chunk store with vector search via the `sqlite-vec` extension.
//!
//! Table layout follows rig-sqlite's convention: a `chunks` table for the
//! document columns and a `chunks_embeddings` vec0 virtual table holding one
//! embedding per chunk, joined by rowid. The virtual table's fixed
//! `float[N]` column is what enforces the store-wide invariant that every
//! vector has identical dimensionality.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::OnceLock;

use rig::OneOrMany;
use rig::embeddings::{Embedding, EmbeddingModel};
use rig_sqlite::{Column, ColumnValue, SqliteVectorStore, SqliteVectorStoreTable};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{Connection, ffi};

use super::{ChunkRecord, KnowledgeStore, RetrievedChunk};
use crate::types::AssistantError;

/// Persisted row shape of the `chunks` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkDocument {
    pub id: String,
    pub url: String,
    pub model_name: String,
    pub date_updated: String,
    pub chunk_index: usize,
    pub content: String,
}

impl SqliteVectorStoreTable for ChunkDocument {
    fn name() -> &'static str {
        "chunks"
    }

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", "TEXT PRIMARY KEY"),
            Column::new("url", "TEXT").indexed(),
            Column::new("model_name", "TEXT").indexed(),
            Column::new("date_updated", "TEXT"),
            Column::new("chunk_index", "TEXT"),
            Column::new("content", "TEXT"),
        ]
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn column_values(&self) -> Vec<(&'static str, Box<dyn ColumnValue>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("url", Box::new(self.url.clone())),
            ("model_name", Box::new(self.model_name.clone())),
            ("date_updated", Box::new(self.date_updated.clone())),
            ("chunk_index", Box::new(self.chunk_index.to_string())),
            ("content", Box::new(self.content.clone())),
        ]
    }
}

impl From<ChunkRecord> for ChunkDocument {
    fn from(record: ChunkRecord) -> Self {
        ChunkDocument {
            id: record.id,
            url: record.url,
            model_name: record.model_name,
            date_updated: record.date_updated,
            chunk_index: record.chunk_index,
            content: record.content,
        }
    }
}

impl From<ChunkDocument> for ChunkRecord {
    fn from(doc: ChunkDocument) -> Self {
        ChunkRecord {
            id: doc.id,
            url: doc.url,
            model_name: doc.model_name,
            date_updated: doc.date_updated,
            chunk_index: doc.chunk_index,
            content: doc.content,
            embedding: None,
        }
    }
}

/// SQLite-backed knowledge store.
#[derive(Clone)]
pub struct SqliteChunkStore<E>
where
    E: EmbeddingModel + 'static,
{
    inner: SqliteVectorStore<E, ChunkDocument>,
    /// Separate connection handle for direct queries not covered by
    /// rig-sqlite. This is a clone of the connection used by the inner store.
    conn: Connection,
}

impl<E> SqliteChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the store at `path`. The embedding model fixes the
    /// dimensionality of the vector table.
    pub async fn open(path: impl AsRef<Path>, model: &E) -> Result<Self, AssistantError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))?;
        conn.call(|conn| {
            let version = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match version {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Rusqlite(err)),
            }
        })
        .await
        .map_err(|err| AssistantError::Storage(err.to_string()))?;
        // Clone connection for direct access before moving into the store.
        let conn_for_queries = conn.clone();
        let store = SqliteVectorStore::new(conn, model)
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))?;
        Ok(Self {
            inner: store,
            conn: conn_for_queries,
        })
    }

    /// Persists documents paired with their embeddings.
    pub async fn add_chunks(
        &self,
        documents: Vec<(ChunkDocument, Vec<f32>)>,
    ) -> Result<(), AssistantError> {
        if documents.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(documents.len());
        for (doc, embedding) in documents {
            let converted: Vec<f64> = embedding.into_iter().map(f64::from).collect();
            let embed = Embedding {
                document: doc.content.clone(),
                vec: converted,
            };
            rows.push((doc, OneOrMany::one(embed)));
        }
        self.inner
            .add_rows(rows)
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))?;
        Ok(())
    }

    fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn register_sqlite_vec() -> Result<(), AssistantError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();

    INIT.get_or_init(|| unsafe {
        type SqliteExtensionInit = unsafe extern "C" fn(
            *mut ffi::sqlite3,
            *mut *mut c_char,
            *const ffi::sqlite3_api_routines,
        ) -> i32;

        let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
        let init_fn: SqliteExtensionInit = transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
        let rc = ffi::sqlite3_auto_extension(Some(init_fn));
        if rc != ffi::SQLITE_OK {
            Err(format!("failed to register sqlite-vec extension (code {rc})"))
        } else {
            Ok(())
        }
    })
    .clone()
    .map_err(AssistantError::Storage)
}

#[async_trait::async_trait]
impl<E> KnowledgeStore for SqliteChunkStore<E>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn insert_chunks(&self, chunks: Vec<ChunkRecord>) -> Result<(), AssistantError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let documents: Vec<(ChunkDocument, Vec<f32>)> = chunks
            .into_iter()
            .filter_map(|record| {
                let embedding = record.embedding.clone()?;
                Some((ChunkDocument::from(record), embedding))
            })
            .collect();

        self.add_chunks(documents).await
    }

    async fn get_chunks_by_url(&self, url: &str) -> Result<Vec<ChunkRecord>, AssistantError> {
        let url = url.to_string();
        self.connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, url, model_name, date_updated, chunk_index, content \
                     FROM chunks WHERE url = ?1 \
                     ORDER BY CAST(chunk_index AS INTEGER) ASC",
                )?;
                let rows = stmt.query_map([&url], |row| {
                    Ok(ChunkDocument {
                        id: row.get(0)?,
                        url: row.get(1)?,
                        model_name: row.get(2)?,
                        date_updated: row.get(3)?,
                        chunk_index: row.get::<_, String>(4)?.parse().unwrap_or(0),
                        content: row.get(5)?,
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(ChunkRecord::from(row?));
                }
                Ok(results)
            })
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))
    }

    async fn delete_chunks_by_url(&self, url: &str) -> Result<usize, AssistantError> {
        let url = url.to_string();
        self.connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                // The embeddings live in a separate vec0 table joined by
                // rowid; remove them first so freed rowids cannot pair a new
                // chunk with a stale vector.
                tx.execute(
                    "DELETE FROM chunks_embeddings \
                     WHERE rowid IN (SELECT rowid FROM chunks WHERE url = ?1)",
                    [&url],
                )?;
                let deleted = tx.execute("DELETE FROM chunks WHERE url = ?1", [&url])?;
                tx.commit()?;
                Ok(deleted)
            })
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))
    }

    async fn search_similar(
        &self,
        query_embedding: &[f32],
        match_threshold: f32,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>, AssistantError> {
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| AssistantError::Storage(err.to_string()))?;
        // sqlite-vec reports cosine distance; similarity = 1 - distance.
        let max_distance = 1.0 - match_threshold;

        self.connection()
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT c.content, c.url, c.model_name, c.date_updated, \
                     vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                     FROM chunks c \
                     JOIN chunks_embeddings e ON e.rowid = c.rowid \
                     WHERE vec_distance_cosine(e.embedding, vec_f32(?1)) <= {max_distance} \
                     ORDER BY distance ASC \
                     LIMIT {match_count}"
                ))?;

                let rows = stmt.query_map([&embedding_json], |row| {
                    let distance: f32 = row.get(4)?;
                    Ok(RetrievedChunk {
                        content: row.get(0)?,
                        url: row.get(1)?,
                        model_name: row.get(2)?,
                        date_updated: row.get(3)?,
                        similarity: 1.0 - distance,
                    })
                })?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, AssistantError> {
        self.connection()
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| AssistantError::Storage(err.to_string()))
    }
}
