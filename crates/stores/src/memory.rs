//! In-memory store backends — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::store::{
    Embedder, EpisodicEntry, EpisodicStore, InsertOutcome, SemanticHit, SemanticStore,
};
use tokio::sync::RwLock;

use crate::vector::cosine_distance;

/// An episodic ledger held entirely in memory.
pub struct InMemoryEpisodicStore {
    entries: Arc<RwLock<Vec<StoredSummary>>>,
}

struct StoredSummary {
    content: String,
    timestamp: f64,
    archived: bool,
    content_hash: String,
}

impl InMemoryEpisodicStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryEpisodicStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EpisodicStore for InMemoryEpisodicStore {
    async fn search(&self, pattern: &str) -> Result<Vec<EpisodicEntry>, StoreError> {
        let entries = self.entries.read().await;
        let mut results: Vec<EpisodicEntry> = entries
            .iter()
            .filter(|e| !e.archived && e.content.contains(pattern))
            .map(|e| EpisodicEntry {
                content: e.content.clone(),
                timestamp: e.timestamp,
                archived: e.archived,
            })
            .collect();

        results.sort_by(|a, b| {
            b.timestamp
                .partial_cmp(&a.timestamp)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(results)
    }

    async fn insert(
        &self,
        content: &str,
        timestamp: f64,
        content_hash: &str,
    ) -> Result<InsertOutcome, StoreError> {
        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.content_hash == content_hash) {
            return Ok(InsertOutcome::Duplicate);
        }
        entries.push(StoredSummary {
            content: content.to_string(),
            timestamp,
            archived: false,
            content_hash: content_hash.to_string(),
        });
        Ok(InsertOutcome::Inserted)
    }

    async fn count_unarchived(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.iter().filter(|e| !e.archived).count())
    }

    async fn archive_all(&self) -> Result<(), StoreError> {
        for entry in self.entries.write().await.iter_mut() {
            entry.archived = true;
        }
        Ok(())
    }
}

/// A semantic vault held entirely in memory.
pub struct InMemorySemanticStore {
    docs: Arc<RwLock<Vec<StoredDoc>>>,
    embedder: Arc<dyn Embedder>,
}

struct StoredDoc {
    content: String,
    timestamp: f64,
    source_name: String,
    content_hash: String,
    embedding: Vec<f32>,
}

impl InMemorySemanticStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            docs: Arc::new(RwLock::new(Vec::new())),
            embedder,
        }
    }

    /// Embed and store a document, deduplicated by content hash.
    pub async fn ingest(
        &self,
        content: &str,
        source_name: &str,
        timestamp: f64,
        content_hash: &str,
    ) -> Result<InsertOutcome, StoreError> {
        {
            let docs = self.docs.read().await;
            if docs.iter().any(|d| d.content_hash == content_hash) {
                return Ok(InsertOutcome::Duplicate);
            }
        }

        let embedding = self.embedder.embed(content).await?;
        self.docs.write().await.push(StoredDoc {
            content: content.to_string(),
            timestamp,
            source_name: source_name.to_string(),
            content_hash: content_hash.to_string(),
            embedding,
        });
        Ok(InsertOutcome::Inserted)
    }

    pub async fn count(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl SemanticStore for InMemorySemanticStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SemanticHit>, StoreError> {
        if k == 0 {
            return Ok(vec![]);
        }

        let query_embedding = self.embedder.embed(query).await?;
        let docs = self.docs.read().await;

        let mut hits: Vec<SemanticHit> = docs
            .iter()
            .map(|d| SemanticHit {
                content: d.content.clone(),
                timestamp: d.timestamp,
                source_name: d.source_name.clone(),
                distance: cosine_distance(&d.embedding, &query_embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }
}
