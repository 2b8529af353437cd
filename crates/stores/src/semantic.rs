//! SQLite semantic vault — the Tier 3 backend.
//!
//! A `documents` table holds ingested reference material with an embedding
//! BLOB per row (little-endian f32). Search embeds the query via the
//! injected `Embedder` collaborator and ranks rows by cosine distance
//! ascending. Ingestion deduplicates by content hash, mirroring the
//! episodic ledger.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::store::{Embedder, InsertOutcome, SemanticHit, SemanticStore};
use tracing::{debug, info};

use crate::vector::cosine_distance;

/// A durable semantic vault backed by SQLite with an external embedder.
pub struct SqliteSemanticStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
}

impl SqliteSemanticStore {
    /// Open (or create) a vault at the given path.
    pub async fn new(path: &str, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool, embedder };
        store.run_migrations().await?;
        info!("Semantic vault initialized at {path} (WAL mode)");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                content      TEXT NOT NULL,
                source_name  TEXT NOT NULL,
                timestamp    REAL NOT NULL,
                content_hash TEXT UNIQUE NOT NULL,
                embedding    BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("documents table: {e}")))?;

        debug!("Semantic vault migrations complete");
        Ok(())
    }

    /// Ingest a document: embed, then store with hash deduplication.
    ///
    /// Ingestion is a write path used by the CLI sync command, not part of
    /// the `SemanticStore` search boundary.
    pub async fn ingest(
        &self,
        content: &str,
        source_name: &str,
        timestamp: f64,
        content_hash: &str,
    ) -> Result<InsertOutcome, StoreError> {
        // Skip the embedding call entirely for known content
        let existing = sqlx::query("SELECT id FROM documents WHERE content_hash = ?1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("vault dedup check: {e}")))?;

        if existing.is_some() {
            debug!(source = source_name, "Duplicate document ignored");
            return Ok(InsertOutcome::Duplicate);
        }

        let embedding = self.embedder.embed(content).await?;
        let blob = embedding_to_blob(&embedding);

        let result = sqlx::query(
            r#"
            INSERT INTO documents (content, source_name, timestamp, content_hash, embedding)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(content_hash) DO NOTHING
            "#,
        )
        .bind(content)
        .bind(source_name)
        .bind(timestamp)
        .bind(content_hash)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("vault insert: {e}")))?;

        if result.rows_affected() > 0 {
            info!(source = source_name, "Document ingested into vault");
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    /// Number of documents in the vault.
    pub async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("vault count: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}

#[async_trait]
impl SemanticStore for SqliteSemanticStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SemanticHit>, StoreError> {
        if k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query).await?;

        let rows = sqlx::query("SELECT content, source_name, timestamp, embedding FROM documents")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("vault scan: {e}")))?;

        let mut hits: Vec<SemanticHit> = rows
            .iter()
            .map(|row| {
                let content: String = row
                    .try_get("content")
                    .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
                let source_name: String = row
                    .try_get("source_name")
                    .map_err(|e| StoreError::QueryFailed(format!("source_name column: {e}")))?;
                let timestamp: f64 = row
                    .try_get("timestamp")
                    .map_err(|e| StoreError::QueryFailed(format!("timestamp column: {e}")))?;
                let blob: Vec<u8> = row
                    .try_get("embedding")
                    .map_err(|e| StoreError::QueryFailed(format!("embedding column: {e}")))?;

                let embedding = blob_to_embedding(&blob);
                Ok(SemanticHit {
                    content,
                    timestamp,
                    source_name,
                    distance: cosine_distance(&embedding, &query_embedding),
                })
            })
            .collect::<Result<_, StoreError>>()?;

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Serialize an embedding vector to little-endian bytes.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Parse an embedding vector from little-endian bytes.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps a handful of known words onto fixed axes so tests control
    /// distances exactly.
    struct AxisEmbedder;

    #[async_trait]
    impl Embedder for AxisEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, StoreError> {
            let lower = text.to_lowercase();
            let mut v = vec![0.0f32; 3];
            if lower.contains("budget") {
                v[0] = 1.0;
            }
            if lower.contains("lease") {
                v[1] = 1.0;
            }
            if lower.contains("recipe") {
                v[2] = 1.0;
            }
            if v.iter().all(|x| *x == 0.0) {
                v[0] = 0.5;
                v[1] = 0.5;
                v[2] = 0.5;
            }
            Ok(v)
        }
    }

    async fn test_store() -> SqliteSemanticStore {
        SqliteSemanticStore::new("sqlite::memory:", Arc::new(AxisEmbedder))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn ingest_and_search_ranks_by_distance() {
        let store = test_store().await;
        store
            .ingest("budget spreadsheet for 2026", "budget.txt", 100.0, "h1")
            .await
            .unwrap();
        store
            .ingest("apartment lease agreement", "lease.txt", 200.0, "h2")
            .await
            .unwrap();

        let hits = store.search("budget planning", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source_name, "budget.txt");
        assert!(hits[0].distance < hits[1].distance);
        assert_eq!(hits[0].timestamp, 100.0);
    }

    #[tokio::test]
    async fn search_respects_k() {
        let store = test_store().await;
        store.ingest("budget a", "a.txt", 1.0, "h1").await.unwrap();
        store.ingest("budget b", "b.txt", 2.0, "h2").await.unwrap();
        store.ingest("budget c", "c.txt", 3.0, "h3").await.unwrap();

        let hits = store.search("budget", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn search_empty_vault_returns_no_hits() {
        let store = test_store().await;
        let hits = store.search("anything", 1).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn ingest_deduplicates_by_hash() {
        let store = test_store().await;
        let first = store
            .ingest("identical doc", "a.txt", 1.0, "same")
            .await
            .unwrap();
        let second = store
            .ingest("identical doc", "b.txt", 2.0, "same")
            .await
            .unwrap();

        assert_eq!(first, InsertOutcome::Inserted);
        assert_eq!(second, InsertOutcome::Duplicate);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn zero_k_is_a_noop() {
        let store = test_store().await;
        store.ingest("budget", "a.txt", 1.0, "h1").await.unwrap();
        let hits = store.search("budget", 0).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let original = vec![0.1f32, -0.2, 0.3, 0.4];
        let blob = embedding_to_blob(&original);
        let decoded = blob_to_embedding(&blob);
        assert_eq!(decoded.len(), 4);
        for (a, b) in original.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
