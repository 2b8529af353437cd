//! SQLite episodic ledger — the Tier 2 backend.
//!
//! A single `session_summaries` table holds one row per archived session
//! summary. The `content_hash` column is UNIQUE so a re-insert of identical
//! content is silently ignored rather than erroring. WAL journal mode is
//! enabled so the fire-and-forget archival task and the session-end save
//! path can write concurrently without corrupting each other.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use strata_core::error::StoreError;
use strata_core::store::{EpisodicEntry, EpisodicStore, InsertOutcome};
use tracing::{debug, info};

/// A durable episodic ledger backed by SQLite.
pub struct SqliteEpisodicStore {
    pool: SqlitePool,
}

impl SqliteEpisodicStore {
    /// Create a new ledger from a file path.
    ///
    /// The database and schema are created automatically.
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
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

        let store = Self { pool };
        store.run_migrations().await?;
        info!("Episodic ledger initialized at {path} (WAL mode)");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_summaries (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                content      TEXT NOT NULL,
                timestamp    REAL NOT NULL,
                archived     INTEGER NOT NULL DEFAULT 0,
                content_hash TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("session_summaries table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_summaries_timestamp
             ON session_summaries(timestamp DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("timestamp index: {e}")))?;

        debug!("Episodic ledger migrations complete");
        Ok(())
    }

    /// Escape SQL LIKE wildcards in user-supplied search text.
    fn escape_like(pattern: &str) -> String {
        pattern
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }
}

#[async_trait]
impl EpisodicStore for SqliteEpisodicStore {
    async fn search(&self, pattern: &str) -> Result<Vec<EpisodicEntry>, StoreError> {
        let like = format!("%{}%", Self::escape_like(pattern));

        let rows = sqlx::query(
            r#"
            SELECT content, timestamp, archived FROM session_summaries
            WHERE content LIKE ?1 ESCAPE '\' AND archived = 0
            ORDER BY timestamp DESC
            "#,
        )
        .bind(&like)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("ledger search: {e}")))?;

        rows.iter()
            .map(|row| {
                let content: String = row
                    .try_get("content")
                    .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
                let timestamp: f64 = row
                    .try_get("timestamp")
                    .map_err(|e| StoreError::QueryFailed(format!("timestamp column: {e}")))?;
                let archived: i64 = row
                    .try_get("archived")
                    .map_err(|e| StoreError::QueryFailed(format!("archived column: {e}")))?;
                Ok(EpisodicEntry {
                    content,
                    timestamp,
                    archived: archived != 0,
                })
            })
            .collect()
    }

    async fn insert(
        &self,
        content: &str,
        timestamp: f64,
        content_hash: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_summaries (content, timestamp, archived, content_hash)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(content_hash) DO NOTHING
            "#,
        )
        .bind(content)
        .bind(timestamp)
        .bind(content_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("ledger insert: {e}")))?;

        if result.rows_affected() > 0 {
            debug!(hash = content_hash, "Ledger entry stored");
            Ok(InsertOutcome::Inserted)
        } else {
            debug!(hash = content_hash, "Duplicate ledger entry ignored");
            Ok(InsertOutcome::Duplicate)
        }
    }

    async fn count_unarchived(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM session_summaries WHERE archived = 0")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("ledger count: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }

    async fn archive_all(&self) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE session_summaries SET archived = 1 WHERE archived = 0")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("ledger archive: {e}")))?;

        info!(rows = result.rows_affected(), "Ledger batch archived");
        Ok(())
    }
}
