//! # Strata Core
//!
//! Domain types, traits, and error definitions for the strata tiered-memory
//! engine. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (inference endpoint, token counter, episodic
//! ledger, semantic vault, embedder) is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod hash;
pub mod inference;
pub mod slot;
pub mod store;
pub mod tokens;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, InferenceError, Result, StoreError, TokenCountError};
pub use hash::content_hash;
pub use inference::InferenceService;
pub use slot::{ActiveSlots, ContextSlot, Tier, epoch_seconds};
pub use store::{Embedder, EpisodicEntry, EpisodicStore, InsertOutcome, SemanticHit, SemanticStore};
pub use tokens::TokenCounter;
pub use turn::{Speaker, Turn};
