//! Budget estimation — token counting that never fails.
//!
//! Wraps the `TokenCounter` collaborator. When the counter errors (missing
//! tokenizer file, encode failure) the estimator silently substitutes
//! `round(word_count * 1.3)`. Degradation is logged at debug level only;
//! no user-visible error is produced.

use std::sync::Arc;
use strata_core::tokens::TokenCounter;
use tracing::debug;

/// A token estimator with a built-in degradation path.
#[derive(Clone)]
pub struct BudgetEstimator {
    counter: Option<Arc<dyn TokenCounter>>,
}

impl BudgetEstimator {
    /// Create an estimator backed by a real counter.
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter: Some(counter),
        }
    }

    /// Create an estimator that always uses the word-count heuristic.
    pub fn heuristic() -> Self {
        Self { counter: None }
    }

    /// Estimate the token count of `text`. Never errors.
    pub fn estimate(&self, text: &str) -> usize {
        match &self.counter {
            Some(counter) => match counter.count(text) {
                Ok(n) => n,
                Err(e) => {
                    debug!(error = %e, "Token counter failed, using word heuristic");
                    heuristic_estimate(text)
                }
            },
            None => heuristic_estimate(text),
        }
    }
}

/// The degradation heuristic: `round(word_count * 1.3)`.
fn heuristic_estimate(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3).round() as usize
}
