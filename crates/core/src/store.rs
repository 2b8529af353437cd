//! Store traits — the durable memory tier collaborators.
//!
//! The core never owns store records beyond a single recall call; these
//! traits are read/write paths into the collaborators. Durability under
//! concurrent writes is the store's own responsibility (WAL or
//! equivalent) — the core's contract is only "fire the write, await it
//! solely at session end".

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One persisted session summary in the episodic ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicEntry {
    /// The summary text
    pub content: String,

    /// Fractional seconds since the Unix epoch
    pub timestamp: f64,

    /// Whether this entry has been consolidated into an archive batch
    pub archived: bool,
}

/// Result of an episodic insert. A duplicate is success-equivalent, not an
/// error — the ledger silently ignores re-inserts of identical content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

/// The Tier 2 collaborator: a durable keyword-searchable log of prior
/// session summaries.
#[async_trait]
pub trait EpisodicStore: Send + Sync {
    /// Substring search over non-archived entries, newest first.
    async fn search(&self, pattern: &str) -> std::result::Result<Vec<EpisodicEntry>, StoreError>;

    /// Insert a summary, deduplicated by content hash.
    async fn insert(
        &self,
        content: &str,
        timestamp: f64,
        content_hash: &str,
    ) -> std::result::Result<InsertOutcome, StoreError>;

    /// Number of entries not yet archived.
    async fn count_unarchived(&self) -> std::result::Result<usize, StoreError>;

    /// Mark every non-archived entry archived in a single batch operation.
    async fn archive_all(&self) -> std::result::Result<(), StoreError>;
}

/// One ranked match from the semantic vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticHit {
    /// The matched document text
    pub content: String,

    /// Ingestion-time metadata, fractional epoch seconds; 0.0 when the
    /// document carried no timestamp
    pub timestamp: f64,

    /// The originating document name
    pub source_name: String,

    /// Cosine distance: 0 = identical, larger = less similar
    pub distance: f64,
}

/// The Tier 3 collaborator: vector-similarity search over ingested
/// documents. Results are ranked by ascending distance.
#[async_trait]
pub trait SemanticStore: Send + Sync {
    /// Similarity search for the `k` closest documents to `query`.
    async fn search(
        &self,
        query: &str,
        k: usize,
    ) -> std::result::Result<Vec<SemanticHit>, StoreError>;
}

/// The embedding collaborator used by vault implementations. The embedding
/// model itself is out of scope; this is a thin call into it.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a dense vector.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, StoreError>;
}
