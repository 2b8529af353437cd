//! TokenCounter trait — approximate token counting for budget decisions.
//!
//! Counting is a pure function of the text. It may fail (missing tokenizer
//! file, malformed vocab); the budget estimator in `strata-context` catches
//! that failure and substitutes a word-count heuristic, so an error here
//! never reaches a user-visible path.

use crate::error::TokenCountError;

/// The token counting collaborator.
pub trait TokenCounter: Send + Sync {
    /// Count the approximate number of tokens in `text`.
    fn count(&self, text: &str) -> std::result::Result<usize, TokenCountError>;
}
