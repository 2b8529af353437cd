//! Episodic recall adapter — Tier 2.
//!
//! Formats ledger search results into a single tagged context slot. The
//! injected block is capped at 800 estimated tokens; the cap is a hard
//! ceiling independent of the elastic Tier-1 budget. Entries are
//! concatenated newest-first, each annotated with its own timestamp, and
//! accumulation stops before the next entry would push the block past the
//! cap.

use crate::estimator::BudgetEstimator;
use chrono::DateTime;
use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::slot::ContextSlot;
use strata_core::store::EpisodicStore;
use tracing::{debug, info};

/// Hard ceiling on the estimated token count of the injected Tier 2 block.
pub const EPISODIC_TOKEN_CAP: usize = 800;

/// Origin tag carried by every Tier 2 slot.
const EPISODIC_SOURCE: &str = "Episodic Ledger";

const BLOCK_HEADER: &str = "--- RELEVANT PAST SESSIONS ---";

/// The Tier 2 recall adapter.
pub struct EpisodicRecall {
    store: Arc<dyn EpisodicStore>,
    estimator: BudgetEstimator,
}

impl EpisodicRecall {
    pub fn new(store: Arc<dyn EpisodicStore>, estimator: BudgetEstimator) -> Self {
        Self { store, estimator }
    }

    /// Search the ledger and build a context slot.
    ///
    /// Returns `Ok(None)` for an empty query or zero matches — a deliberate
    /// "no data" outcome, distinct from a store failure.
    pub async fn recall(&self, query: &str) -> Result<Option<ContextSlot>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let entries = self.store.search(query).await?;
        if entries.is_empty() {
            info!(query, "No matching ledger entries");
            return Ok(None);
        }

        // Entries arrive newest-first; the slot's timestamp is the newest
        // matched entry's.
        let newest = entries[0].timestamp;

        let mut block = String::from(BLOCK_HEADER);
        let mut included = 0usize;
        for entry in &entries {
            let line = format!("\n[{}] {}", format_timestamp(entry.timestamp), entry.content);
            if self.estimator.estimate(&(block.clone() + &line)) > EPISODIC_TOKEN_CAP {
                break;
            }
            block.push_str(&line);
            included += 1;
        }

        debug!(
            matches = entries.len(),
            included, "Tier 2 context assembled"
        );

        Ok(Some(ContextSlot {
            content: block,
            timestamp: newest,
            source: EPISODIC_SOURCE.into(),
            distance: None,
        }))
    }
}

/// Render a fractional epoch timestamp as a readable UTC annotation.
fn format_timestamp(epoch: f64) -> String {
    DateTime::from_timestamp(epoch as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| format!("{epoch:.0}"))
}
