//! Content hashing — the deduplication key shared by both durable tiers.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a content string.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
