//! Semantic recall adapter — Tier 3.
//!
//! Expands the query with near-synonyms (bounded to keep query drift in
//! check), asks the vault for its single best match, and applies the
//! gatekeeper: a match is accepted only when its cosine distance is at or
//! below 0.5. A rejection is an informational outcome, not an error —
//! low-confidence matches must never be presented to the generator as
//! ground truth.

use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::slot::ContextSlot;
use strata_core::store::SemanticStore;
use tracing::{debug, info};

/// Gatekeeper ceiling: cosine distance, 0 = identical. Inclusive.
pub const DISTANCE_THRESHOLD: f64 = 0.5;

/// Upper bound on added synonym terms, to keep expansion from drifting the
/// query away from the user's intent.
const MAX_EXPANSION_TERMS: usize = 5;

/// A compact near-synonym lexicon for everyday recall vocabulary.
static SYNONYMS: &[(&str, &[&str])] = &[
    ("budget", &["funds", "finances", "spending"]),
    ("funds", &["budget", "money"]),
    ("money", &["funds", "cash"]),
    ("meeting", &["appointment", "session"]),
    ("appointment", &["meeting", "booking"]),
    ("doctor", &["physician", "medic"]),
    ("car", &["vehicle", "automobile"]),
    ("house", &["home", "residence"]),
    ("home", &["house", "residence"]),
    ("job", &["work", "employment"]),
    ("work", &["job", "task"]),
    ("trip", &["travel", "journey"]),
    ("travel", &["trip", "journey"]),
    ("food", &["meal", "cuisine"]),
    ("buy", &["purchase", "acquire"]),
    ("sell", &["offload", "trade"]),
    ("plan", &["schedule", "agenda"]),
    ("contract", &["agreement", "lease"]),
    ("lease", &["contract", "rental"]),
    ("bill", &["invoice", "payment"]),
    ("email", &["mail", "message"]),
    ("phone", &["mobile", "telephone"]),
    ("computer", &["laptop", "machine"]),
    ("project", &["initiative", "effort"]),
    ("report", &["summary", "document"]),
];

/// Expand a query by appending near-synonyms of its words, capped at
/// [`MAX_EXPANSION_TERMS`] added terms. The original query is always kept
/// intact at the front.
pub fn expand_query(query: &str) -> String {
    let mut added: Vec<String> = Vec::new();

    'words: for word in query.split_whitespace() {
        let word = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.is_empty() {
            continue;
        }
        if let Some((_, synonyms)) = SYNONYMS.iter().find(|(key, _)| *key == word) {
            for syn in synonyms.iter() {
                if added.len() >= MAX_EXPANSION_TERMS {
                    break 'words;
                }
                if !added.iter().any(|a| a == syn) && !query.to_lowercase().contains(syn) {
                    added.push((*syn).to_string());
                }
            }
        }
    }

    if added.is_empty() {
        query.to_string()
    } else {
        format!("{query} {}", added.join(" "))
    }
}

/// The Tier 3 recall adapter.
pub struct SemanticRecall {
    store: Arc<dyn SemanticStore>,
}

impl SemanticRecall {
    pub fn new(store: Arc<dyn SemanticStore>) -> Self {
        Self { store }
    }

    /// Search the vault for the single best match and gate it.
    ///
    /// Returns `Ok(None)` for an empty query, an empty vault, or a match
    /// above the distance threshold — all deliberate "no data" outcomes,
    /// distinct from a store failure.
    pub async fn search(&self, query: &str) -> Result<Option<ContextSlot>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let expanded = expand_query(query);
        debug!(query, expanded = %expanded, "Vault search");

        let hits = self.store.search(&expanded, 1).await?;
        let Some(hit) = hits.into_iter().next() else {
            info!(query, "Vault returned no candidates");
            return Ok(None);
        };

        if hit.distance > DISTANCE_THRESHOLD {
            info!(
                distance = format!("{:.4}", hit.distance),
                source = %hit.source_name,
                "Best vault match too weak, ignoring"
            );
            return Ok(None);
        }

        Ok(Some(ContextSlot {
            content: hit.content,
            timestamp: hit.timestamp,
            source: format!("Vault ({})", hit.source_name),
            distance: Some(hit.distance),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::store::SemanticHit;

    /// A vault stub returning one preset hit, or failing on demand.
    struct StubVault {
        hit: Option<SemanticHit>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SemanticStore for StubVault {
        async fn search(&self, _query: &str, k: usize) -> Result<Vec<SemanticHit>, StoreError> {
            if self.fail {
                return Err(StoreError::QueryFailed("vault offline".into()));
            }
            Ok(self.hit.iter().cloned().take(k).collect())
        }
    }

    fn adapter(hit: Option<SemanticHit>) -> SemanticRecall {
        SemanticRecall::new(Arc::new(StubVault { hit, fail: false }))
    }

    fn hit(distance: f64) -> SemanticHit {
        SemanticHit {
            content: "The lease runs for 12 months.".into(),
            timestamp: 1700000000.0,
            source_name: "lease.txt".into(),
            distance,
        }
    }

    #[test]
    fn expansion_adds_synonyms() {
        let expanded = expand_query("budget review");
        assert!(expanded.starts_with("budget review"));
        assert!(expanded.contains("funds"));
    }

    #[test]
    fn expansion_is_capped_at_five_terms() {
        let expanded = expand_query("budget meeting car house trip food plan");
        let added = expanded.split_whitespace().count() - 7;
        assert!(added <= 5, "added {added} terms: {expanded}");
    }

    #[test]
    fn expansion_without_lexicon_hits_is_identity() {
        assert_eq!(expand_query("xylophone quartz"), "xylophone quartz");
    }

    #[test]
    fn expansion_ignores_punctuation_and_case() {
        let expanded = expand_query("Budget?");
        assert!(expanded.contains("funds"));
    }

    #[test]
    fn expansion_does_not_duplicate_terms() {
        let expanded = expand_query("budget funds");
        let terms: Vec<&str> = expanded.split_whitespace().collect();
        let mut seen = std::collections::HashSet::new();
        for t in &terms {
            assert!(seen.insert(*t), "duplicate term {t} in {expanded}");
        }
    }

    #[tokio::test]
    async fn gatekeeper_accepts_at_exactly_the_threshold() {
        let recall = adapter(Some(hit(0.5)));
        let slot = recall.search("lease terms").await.unwrap();
        assert!(slot.is_some());
        assert_eq!(slot.unwrap().distance, Some(0.5));
    }

    #[tokio::test]
    async fn gatekeeper_rejects_just_above_the_threshold() {
        let recall = adapter(Some(hit(0.5000001)));
        assert!(recall.search("lease terms").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn accepted_slot_carries_metadata() {
        let recall = adapter(Some(hit(0.3)));
        let slot = recall.search("lease").await.unwrap().unwrap();
        assert_eq!(slot.timestamp, 1700000000.0);
        assert_eq!(slot.source, "Vault (lease.txt)");
        assert_eq!(slot.distance, Some(0.3));
        assert!(slot.content.contains("12 months"));
    }

    #[tokio::test]
    async fn empty_query_yields_no_slot() {
        let recall = adapter(Some(hit(0.1)));
        assert!(recall.search("  ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_vault_yields_no_slot() {
        let recall = adapter(None);
        assert!(recall.search("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failure_is_an_error() {
        let recall = SemanticRecall::new(Arc::new(StubVault {
            hit: None,
            fail: true,
        }));
        assert!(recall.search("anything").await.is_err());
    }
}
