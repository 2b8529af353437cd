//! Consolidation — summary archival into the episodic ledger and the
//! batch-archive trigger.
//!
//! Two write paths share the same save routine:
//! - **Session end**: the full transcript is summarized and persisted, and
//!   the call is awaited before shutdown.
//! - **Background pruning**: the detached slice from a Tier-1 prune is
//!   summarized on a fire-and-forget task; its completion (or failure) is
//!   observed only through the log, never through a value the main loop
//!   consumes. The task receives an owned snapshot of the pruned turns and
//!   never touches the live buffer.
//!
//! `consolidate()` is a monotonic counter-threshold machine: once seven
//! unarchived summaries have accumulated, all of them are archived in one
//! batch. Archived entries never un-archive.

use std::sync::Arc;
use strata_core::error::{Error, StoreError};
use strata_core::hash::content_hash;
use strata_core::inference::InferenceService;
use strata_core::slot::epoch_seconds;
use strata_core::store::{EpisodicStore, InsertOutcome};
use strata_core::turn::{Turn, render_transcript};
use tracing::{info, warn};

/// Unarchived-summary count at which a batch archive fires.
pub const CONSOLIDATION_THRESHOLD: usize = 7;

/// The summarization request runs under this system-role instruction, not
/// the persona.
const ARCHIVIST_INSTRUCTION: &str = "You are a session archivist. Condense the following \
     conversation transcript into one concise, factual paragraph for long-term records.";

/// Persists session summaries and triggers batch archival.
#[derive(Clone)]
pub struct Consolidator {
    store: Arc<dyn EpisodicStore>,
    inference: Arc<dyn InferenceService>,
}

impl Consolidator {
    pub fn new(store: Arc<dyn EpisodicStore>, inference: Arc<dyn InferenceService>) -> Self {
        Self { store, inference }
    }

    /// Summarize a transcript and persist it, deduplicated by content
    /// hash. A duplicate insert is success-equivalent.
    pub async fn save_summary(&self, transcript: &str) -> Result<InsertOutcome, Error> {
        let summary = self
            .inference
            .generate(ARCHIVIST_INSTRUCTION, "", transcript)
            .await?;

        let outcome = self
            .store
            .insert(&summary, epoch_seconds(), &content_hash(&summary))
            .await?;

        match outcome {
            InsertOutcome::Inserted => info!("Session summary persisted to ledger"),
            InsertOutcome::Duplicate => info!("Session summary already in ledger"),
        }
        Ok(outcome)
    }

    /// Archive every unarchived summary once the threshold is reached.
    /// Returns whether a batch archive fired.
    pub async fn consolidate(&self) -> Result<bool, StoreError> {
        let count = self.store.count_unarchived().await?;
        if count >= CONSOLIDATION_THRESHOLD {
            info!(count, "Consolidation threshold reached, archiving batch");
            self.store.archive_all().await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Session-end path: summarize a non-empty history, persist it, then
    /// run the consolidation check. Awaited by the caller before shutdown.
    pub async fn on_session_end(&self, transcript: &str) -> Result<(), Error> {
        if transcript.trim().is_empty() {
            return Ok(());
        }
        self.save_summary(transcript).await?;
        self.consolidate().await?;
        Ok(())
    }

    /// Background pruning path: summarize and persist a detached slice on
    /// a fire-and-forget task. Returns immediately; the task always runs
    /// to completion (no cancellation, no timeout), and no ordering is
    /// guaranteed between two concurrently dispatched archivals beyond the
    /// store's own atomic-insert guarantee.
    pub fn archive_detached(&self, turns: Vec<Turn>) {
        if turns.is_empty() {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            let transcript = render_transcript(&turns);
            match this.save_summary(&transcript).await {
                Ok(_) => info!(turns = turns.len(), "Background archival complete"),
                Err(e) => warn!(error = %e, "Background archival failed"),
            }
        });
    }
}
