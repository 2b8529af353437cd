//! Token counting via a HuggingFace `tokenizer.json`.
//!
//! Loading and encoding can both fail (missing file, malformed vocab,
//! unsupported model type). Neither failure is surfaced to the user: the
//! budget estimator catches the error and falls back to its word-count
//! heuristic.

use std::path::Path;
use strata_core::error::TokenCountError;
use strata_core::tokens::TokenCounter;
use tokenizers::Tokenizer;
use tracing::info;

/// A precise token counter backed by a HuggingFace tokenizer file.
#[derive(Debug)]
pub struct HfTokenCounter {
    inner: Tokenizer,
}

impl HfTokenCounter {
    /// Load a tokenizer from a `tokenizer.json` file.
    pub fn from_file(path: &Path) -> Result<Self, TokenCountError> {
        let inner = Tokenizer::from_file(path)
            .map_err(|e| TokenCountError(format!("load {}: {e}", path.display())))?;
        info!(path = %path.display(), "Tokenizer loaded");
        Ok(Self { inner })
    }
}

impl TokenCounter for HfTokenCounter {
    fn count(&self, text: &str) -> Result<usize, TokenCountError> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| TokenCountError(format!("encode: {e}")))?;
        Ok(encoding.get_ids().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let result = HfTokenCounter::from_file(Path::new("/nonexistent/tokenizer.json"));
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("tokenizer.json"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tokenizer.json");
        std::fs::write(&path, "{ not valid tokenizer json").unwrap();
        assert!(HfTokenCounter::from_file(&path).is_err());
    }
}
