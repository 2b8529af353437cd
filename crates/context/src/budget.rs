//! Elastic budget controller — the live Tier-1 token ceiling.
//!
//! The effective limit is `base + reserve` when no Tier 2/3 slot is
//! active, and exactly `base` once any slot is active: injected context
//! eats the reserve. The limit is derived on every call, never cached
//! across turns.

use crate::history::RollingHistory;
use strata_core::slot::ActiveSlots;
use strata_core::turn::Turn;
use tracing::info;

/// Fraction of the buffer pruned when the ceiling is exceeded.
pub const PRUNE_FRACTION: f64 = 0.25;

/// Computes the Tier-1 ceiling and triggers pruning when exceeded.
#[derive(Debug, Clone, Copy)]
pub struct ElasticBudgetController {
    base_limit: usize,
    reserve: usize,
}

impl ElasticBudgetController {
    pub fn new(base_limit: usize, reserve: usize) -> Self {
        Self {
            base_limit,
            reserve,
        }
    }

    /// The current ceiling, derived from which slots are active.
    pub fn effective_limit(&self, slots: &ActiveSlots) -> usize {
        if slots.is_empty() {
            self.base_limit + self.reserve
        } else {
            self.base_limit
        }
    }

    /// Check the buffer against the current ceiling; when exceeded, prune
    /// the oldest quarter and return the detached slice for archival.
    ///
    /// Archival is the caller's responsibility and must not block the
    /// current turn.
    pub fn enforce(
        &self,
        history: &mut RollingHistory,
        slots: &ActiveSlots,
    ) -> Option<Vec<Turn>> {
        let limit = self.effective_limit(slots);
        let current = history.estimate_tokens();

        if current <= limit {
            return None;
        }

        let removed = history.prune_oldest(PRUNE_FRACTION);
        info!(
            tokens = current,
            limit,
            pruned = removed.len(),
            "Tier 1 over budget, oldest slice detached for archival"
        );
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::BudgetEstimator;
    use strata_core::slot::{ContextSlot, Tier};

    fn slot() -> ContextSlot {
        ContextSlot {
            content: "ctx".into(),
            timestamp: 1.0,
            source: "test".into(),
            distance: None,
        }
    }

    #[test]
    fn no_active_slot_includes_reserve() {
        let controller = ElasticBudgetController::new(2048, 512);
        let slots = ActiveSlots::new();
        assert_eq!(controller.effective_limit(&slots), 2560);
    }

    #[test]
    fn any_active_slot_excludes_reserve() {
        let controller = ElasticBudgetController::new(2048, 512);

        let mut episodic_only = ActiveSlots::new();
        episodic_only.replace(Tier::Episodic, slot());
        assert_eq!(controller.effective_limit(&episodic_only), 2048);

        let mut semantic_only = ActiveSlots::new();
        semantic_only.replace(Tier::Semantic, slot());
        assert_eq!(controller.effective_limit(&semantic_only), 2048);

        let mut both = ActiveSlots::new();
        both.replace(Tier::Episodic, slot());
        both.replace(Tier::Semantic, slot());
        assert_eq!(controller.effective_limit(&both), 2048);
    }

    #[test]
    fn limit_recomputes_after_clear() {
        let controller = ElasticBudgetController::new(100, 50);
        let mut slots = ActiveSlots::new();
        slots.replace(Tier::Episodic, slot());
        assert_eq!(controller.effective_limit(&slots), 100);

        slots.clear();
        assert_eq!(controller.effective_limit(&slots), 150);
    }

    #[test]
    fn enforce_prunes_quarter_when_over() {
        // Heuristic: each turn "word word word word" ≈ 4 words ≈ 5 tokens,
        // plus the "User:" prefix ≈ 7 tokens per rendered line.
        let controller = ElasticBudgetController::new(10, 0);
        let mut history = RollingHistory::new(BudgetEstimator::heuristic());
        for _ in 0..8 {
            history.append(Turn::user("word word word word"));
        }
        assert!(history.estimate_tokens() > 10);

        let removed = controller.enforce(&mut history, &ActiveSlots::new());
        let removed = removed.expect("should prune");
        assert_eq!(removed.len(), 2); // floor(8 * 0.25)
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn enforce_is_noop_under_limit() {
        let controller = ElasticBudgetController::new(1000, 0);
        let mut history = RollingHistory::new(BudgetEstimator::heuristic());
        history.append(Turn::user("short"));

        assert!(controller.enforce(&mut history, &ActiveSlots::new()).is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn enforce_is_noop_on_empty_history() {
        let controller = ElasticBudgetController::new(0, 0);
        let mut history = RollingHistory::new(BudgetEstimator::heuristic());
        assert!(controller.enforce(&mut history, &ActiveSlots::new()).is_none());
    }
}
