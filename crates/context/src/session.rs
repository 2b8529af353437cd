//! Session engine — the per-turn pipeline.
//!
//! One user turn is fully processed before the next input is read:
//! budget check (and prune dispatch) → Tier 2/3 merge → inference →
//! history update. The inference call and store queries are blocking from
//! this loop's perspective; only pruning archival leaves the turn as a
//! detached task.
//!
//! Collaborator failures surface as `Err` from the turn handler; the
//! caller reports them and keeps the loop alive — a failed turn leaves the
//! history untouched.

use crate::budget::ElasticBudgetController;
use crate::consolidate::Consolidator;
use crate::episodic::EpisodicRecall;
use crate::estimator::BudgetEstimator;
use crate::history::RollingHistory;
use crate::orchestrator;
use crate::semantic::SemanticRecall;
use std::sync::Arc;
use strata_core::error::{Error, StoreError};
use strata_core::inference::InferenceService;
use strata_core::slot::{ActiveSlots, ContextSlot, Tier};
use strata_core::store::{EpisodicStore, SemanticStore};
use strata_core::turn::Turn;
use tracing::debug;

const HISTORY_HEADER: &str = "--- CONVERSATION SO FAR ---";

/// One interactive session: persona, rolling history, active slots, and
/// the collaborators behind them.
pub struct Session {
    persona: String,
    inference: Arc<dyn InferenceService>,
    episodic: EpisodicRecall,
    semantic: SemanticRecall,
    consolidator: Consolidator,
    controller: ElasticBudgetController,
    history: RollingHistory,
    slots: ActiveSlots,
}

impl Session {
    pub fn new(
        persona: impl Into<String>,
        inference: Arc<dyn InferenceService>,
        episodic_store: Arc<dyn EpisodicStore>,
        semantic_store: Arc<dyn SemanticStore>,
        estimator: BudgetEstimator,
        controller: ElasticBudgetController,
    ) -> Self {
        Self {
            persona: persona.into(),
            inference: inference.clone(),
            episodic: EpisodicRecall::new(episodic_store.clone(), estimator.clone()),
            semantic: SemanticRecall::new(semantic_store),
            consolidator: Consolidator::new(episodic_store, inference),
            controller,
            history: RollingHistory::new(estimator),
            slots: ActiveSlots::new(),
        }
    }

    /// Process one user turn end to end and return the generated reply.
    pub async fn handle_turn(&mut self, user_text: &str) -> Result<String, Error> {
        // Ceiling first: derived fresh, checked against the current buffer.
        if let Some(removed) = self.controller.enforce(&mut self.history, &self.slots) {
            self.consolidator.archive_detached(removed);
        }

        let context = self.assemble_context();
        debug!(context_len = context.len(), "Context assembled");

        let reply = self
            .inference
            .generate(&self.persona, &context, user_text)
            .await?;

        self.history.append(Turn::user(user_text));
        self.history.append(Turn::agent(reply.clone()));

        Ok(reply)
    }

    /// The merged Tier 2/3 block followed by the Tier 1 transcript.
    fn assemble_context(&self) -> String {
        let merged = orchestrator::merge(self.slots.episodic(), self.slots.semantic());
        if self.history.is_empty() {
            merged
        } else {
            format!("{merged}\n\n{HISTORY_HEADER}\n{}", self.history.transcript())
        }
    }

    /// `/recall` handler: search the ledger and activate the Tier 2 slot
    /// on success. Returns the activated slot, or `None` when nothing
    /// matched.
    pub async fn recall(&mut self, query: &str) -> Result<Option<ContextSlot>, StoreError> {
        let slot = self.episodic.recall(query).await?;
        if let Some(slot) = &slot {
            self.slots.replace(Tier::Episodic, slot.clone());
        }
        Ok(slot)
    }

    /// `/vault` handler: search the vault and activate the Tier 3 slot on
    /// an accepted match. Returns the activated slot, or `None` when the
    /// gatekeeper rejected or nothing matched.
    pub async fn vault_search(&mut self, query: &str) -> Result<Option<ContextSlot>, StoreError> {
        let slot = self.semantic.search(query).await?;
        if let Some(slot) = &slot {
            self.slots.replace(Tier::Semantic, slot.clone());
        }
        Ok(slot)
    }

    /// `/clear` handler: deactivate both tier slots.
    pub fn clear_context(&mut self) {
        self.slots.clear();
    }

    /// The prompt block the next turn would inject (merge of active slots).
    pub fn merged_context(&self) -> String {
        orchestrator::merge(self.slots.episodic(), self.slots.semantic())
    }

    /// Session end: summarize and persist a non-empty history, then run
    /// the consolidation check. Awaited before shutdown.
    pub async fn end(&self) -> Result<(), Error> {
        self.consolidator.on_session_end(&self.history.transcript()).await
    }

    /// The rolling history buffer (read-only).
    pub fn history(&self) -> &RollingHistory {
        &self.history
    }

    /// The currently active slots (read-only).
    pub fn active_slots(&self) -> &ActiveSlots {
        &self.slots
    }

    /// The current effective Tier-1 ceiling.
    pub fn effective_limit(&self) -> usize {
        self.controller.effective_limit(&self.slots)
    }
}
