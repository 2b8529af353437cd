//! Rolling history buffer — Tier 1, the short-term turn log.
//!
//! Append-only; no size limit is enforced internally. The token estimate
//! is recomputed from the current full buffer on every call — it is never
//! cached across turns. Pruning removes from the front (oldest) only and
//! returns the detached slice; archival of that slice is the caller's
//! responsibility.

use crate::estimator::BudgetEstimator;
use strata_core::turn::{Turn, render_transcript};

/// The Tier 1 conversation buffer.
pub struct RollingHistory {
    turns: Vec<Turn>,
    estimator: BudgetEstimator,
}

impl RollingHistory {
    /// Create an empty buffer.
    pub fn new(estimator: BudgetEstimator) -> Self {
        Self {
            turns: Vec::new(),
            estimator,
        }
    }

    /// Append a turn to the end of the buffer.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Number of turns currently held.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when no turns are held.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The turns in conversational order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Render the full buffer as a transcript.
    pub fn transcript(&self) -> String {
        render_transcript(&self.turns)
    }

    /// Estimate tokens over the full formatted buffer. Recomputed from the
    /// current contents on every call.
    pub fn estimate_tokens(&self) -> usize {
        self.estimator.estimate(&self.transcript())
    }

    /// Remove the oldest `max(1, floor(len * fraction))` turns and return
    /// them in their original order. No-op on an empty buffer.
    pub fn prune_oldest(&mut self, fraction: f64) -> Vec<Turn> {
        if self.turns.is_empty() {
            return Vec::new();
        }
        let count = ((self.turns.len() as f64 * fraction).floor() as usize).max(1);
        let count = count.min(self.turns.len());
        self.turns.drain(..count).collect()
    }
}
