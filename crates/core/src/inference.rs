//! InferenceService trait — the abstraction over the generation endpoint.
//!
//! The boundary is three strings in, one string out: a persona (or
//! system-role instruction), an injected context block (possibly empty),
//! and the user's message. The call is blocking from the main loop's
//! perspective; no cancellation is observed by the core. Failure is fatal
//! to the current turn only — callers report it and continue.

use crate::error::InferenceError;
use async_trait::async_trait;

/// The generation endpoint collaborator.
///
/// Implementations: OpenAI-compatible HTTP endpoints (Ollama, vLLM, hosted
/// APIs), scripted stubs for tests.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// A human-readable name for this service (e.g., "ollama").
    fn name(&self) -> &str;

    /// Generate a reply to `user` given a persona and an injected context
    /// block. Must tolerate an empty `context`.
    async fn generate(
        &self,
        persona: &str,
        context: &str,
        user: &str,
    ) -> std::result::Result<String, InferenceError>;
}
