//! Conflict orchestrator — merges the active Tier 2/3 slots into one
//! prompt-ready block.
//!
//! A pure function of the two optional slots: identical inputs always
//! produce identical output, and merging has no side effects. When both
//! tiers are active, the slot with the strictly greater timestamp is
//! declared authoritative; both bodies are still included, and a fixed
//! instruction tells the generator to prefer the flagged tier on
//! conflicting facts. Equal timestamps resolve to Tier 2 — Tier 3
//! timestamps may default to epoch 0 and must never spuriously win.

use strata_core::slot::{ContextSlot, Tier};

/// Emitted when neither tier has an active slot.
pub const NO_EXTERNAL_CONTEXT: &str = "[No external documents or past sessions loaded.]";

/// Appended when both tiers are active, directing the generator to the
/// flagged tier on conflicting facts.
pub const CONFLICT_INSTRUCTION: &str =
    "If the sources above disagree on a fact, prefer the section flagged as most recent.";

/// Merge the active slots into one prompt-ready text block.
pub fn merge(episodic: Option<&ContextSlot>, semantic: Option<&ContextSlot>) -> String {
    match (episodic, semantic) {
        (None, None) => NO_EXTERNAL_CONTEXT.to_string(),
        (Some(slot), None) => render_block(Tier::Episodic, slot),
        (None, Some(slot)) => render_block(Tier::Semantic, slot),
        (Some(t2), Some(t3)) => {
            let winner = if t3.timestamp > t2.timestamp {
                Tier::Semantic
            } else {
                Tier::Episodic
            };
            format!(
                "[NOTICE] Sources disagree on recency; {} holds the most recent information.\n\n{}\n\n{}\n\n{}",
                winner.label(),
                render_block(Tier::Episodic, t2),
                render_block(Tier::Semantic, t3),
                CONFLICT_INSTRUCTION,
            )
        }
    }
}

fn render_block(tier: Tier, slot: &ContextSlot) -> String {
    format!("=== {} | {} ===\n{}", tier.label(), slot.source, slot.content)
}
