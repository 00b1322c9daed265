//! SQLite-backed vector store.
//!
//! In-process store using SQLite for chunk rows and brute-force cosine
//! similarity for search. The database is produced by the ingestion
//! pipeline; at serve time it must already exist.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, RagStore, StoredChunk};
use crate::core::errors::ApiError;

#[derive(Debug)]
pub struct SqliteRagStore {
    pool: SqlitePool,
}

impl SqliteRagStore {
    /// Open an existing store. Fails if the database file is absent, so a
    /// misconfigured deployment dies at startup instead of answering from
    /// an empty index.
    pub async fn open(db_path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let db_path = db_path.as_ref();
        if !db_path.exists() {
            return Err(ApiError::NotFound(format!(
                "vector store not found at {}; run the ingestion pipeline first",
                db_path.display()
            )));
        }
        Self::connect(db_path, false).await
    }

    /// Create (or open) a store, used by fixtures and the ingestion side.
    pub async fn create(db_path: impl AsRef<Path>) -> Result<Self, ApiError> {
        Self::connect(db_path.as_ref(), true).await
    }

    async fn connect(db_path: &Path, create_if_missing: bool) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                chunk_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT '',
                metadata TEXT DEFAULT '{}',
                embedding BLOB,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> StoredChunk {
        let metadata_str: String = row.get("metadata");
        let metadata = serde_json::from_str::<Value>(&metadata_str).ok();

        StoredChunk {
            chunk_id: row.get("chunk_id"),
            content: row.get("content"),
            source: row.get("source"),
            metadata,
        }
    }
}

#[async_trait]
impl RagStore for SqliteRagStore {
    async fn insert(&self, chunk: StoredChunk, embedding: Vec<f32>) -> Result<(), ApiError> {
        let blob = Self::serialize_embedding(&embedding);
        let metadata_str = chunk
            .metadata
            .as_ref()
            .map(|m| serde_json::to_string(m).unwrap_or_default())
            .unwrap_or_else(|| "{}".to_string());

        sqlx::query(
            "INSERT OR REPLACE INTO chunks (chunk_id, content, source, metadata, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&chunk.chunk_id)
        .bind(&chunk.content)
        .bind(&chunk.source)
        .bind(&metadata_str)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let rows = sqlx::query(
            "SELECT chunk_id, content, source, metadata, embedding FROM chunks
             WHERE embedding IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut results: Vec<ChunkSearchResult> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let embedding = Self::deserialize_embedding(&blob);
                let score = Self::cosine_similarity(query_embedding, &embedding);
                ChunkSearchResult {
                    chunk: Self::row_to_chunk(row),
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chunk(id: &str, content: &str, source: &str, page: Option<i64>) -> StoredChunk {
        StoredChunk {
            chunk_id: id.to_string(),
            content: content.to_string(),
            source: source.to_string(),
            metadata: page.map(|p| json!({ "page": p })),
        }
    }

    #[tokio::test]
    async fn open_fails_when_store_is_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SqliteRagStore::open(dir.path().join("absent.db"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn search_ranks_by_cosine_similarity() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteRagStore::create(dir.path().join("rag.db"))
            .await
            .expect("create store");

        store
            .insert(chunk("a", "close match", "a.pdf", Some(2)), vec![1.0, 0.0])
            .await
            .expect("insert");
        store
            .insert(chunk("b", "far match", "b.pdf", None), vec![0.0, 1.0])
            .await
            .expect("insert");
        store
            .insert(chunk("c", "middling", "c.pdf", None), vec![0.7, 0.3])
            .await
            .expect("insert");

        let results = store.search(&[1.0, 0.0], 2).await.expect("search");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.chunk_id, "a");
        assert_eq!(results[1].chunk.chunk_id, "c");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn count_reflects_inserts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteRagStore::create(dir.path().join("rag.db"))
            .await
            .expect("create store");

        assert_eq!(store.count().await.expect("count"), 0);
        store
            .insert(chunk("a", "text", "a.pdf", None), vec![1.0])
            .await
            .expect("insert");
        assert_eq!(store.count().await.expect("count"), 1);
    }
}
