//! Context slot domain types — a tier's currently active injected context.
//!
//! A `ContextSlot` is a value object: no shared mutable state, copied into
//! the orchestrator on read. At most one slot is active per tier at any
//! time; a new successful recall/search replaces the prior slot for that
//! tier, and an explicit clear removes both. `ActiveSlots` enforces that
//! invariant.
//!
//! Slot timestamps are fractional seconds since the Unix epoch so that
//! Tier 2 and Tier 3 readings compare directly without unit conversion.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The durable memory tiers that can inject context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Tier 2 — keyword-searchable episodic summary ledger
    Episodic,
    /// Tier 3 — vector-similarity document vault
    Semantic,
}

impl Tier {
    /// Human-readable tier label used in prompt blocks and notices.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Episodic => "PAST SESSIONS (Tier 2)",
            Tier::Semantic => "REFERENCE DOCUMENTS (Tier 3)",
        }
    }
}

/// A tier's currently active injected context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSlot {
    /// The prompt-ready text for this tier
    pub content: String,

    /// Fractional seconds since the Unix epoch; comparable across tiers
    pub timestamp: f64,

    /// Human-readable origin tag (ledger label, document name)
    pub source: String,

    /// Cosine distance of the winning match (Tier 3 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// The set of currently active slots — at most one per tier.
///
/// Read and replaced only by the main loop; background tasks never touch it.
#[derive(Debug, Clone, Default)]
pub struct ActiveSlots {
    episodic: Option<ContextSlot>,
    semantic: Option<ContextSlot>,
}

impl ActiveSlots {
    /// Create with no active slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active slot for a tier. The prior slot, if any, is dropped.
    pub fn replace(&mut self, tier: Tier, slot: ContextSlot) {
        match tier {
            Tier::Episodic => self.episodic = Some(slot),
            Tier::Semantic => self.semantic = Some(slot),
        }
    }

    /// Remove both active slots.
    pub fn clear(&mut self) {
        self.episodic = None;
        self.semantic = None;
    }

    /// The active Tier 2 slot, if any.
    pub fn episodic(&self) -> Option<&ContextSlot> {
        self.episodic.as_ref()
    }

    /// The active Tier 3 slot, if any.
    pub fn semantic(&self) -> Option<&ContextSlot> {
        self.semantic.as_ref()
    }

    /// True when no slot is active on either tier.
    pub fn is_empty(&self) -> bool {
        self.episodic.is_none() && self.semantic.is_none()
    }
}

/// Current wall clock as fractional seconds since the Unix epoch.
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
