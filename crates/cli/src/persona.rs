//! Persona loading — a thin shim over a markdown file.
//!
//! The persona carries a current-time header so the generator always knows
//! the wall clock. Its token overhead is checked against a fixed budget;
//! when exceeded, trailing paragraphs are dropped until it fits, so the
//! system block never crowds out the conversation itself.

use chrono::Local;
use std::path::Path;
use strata_config::AppConfig;
use strata_context::BudgetEstimator;
use tracing::{debug, info};

/// Token budget for the persona block.
pub const PERSONA_TOKEN_BUDGET: usize = 500;

const TRIM_MARKER: &str = "[Additional notes summarized for space.]";

const DEFAULT_PERSONA: &str = "You are strata, a concise and factual personal assistant. \
     Ground every answer in the supplied context when it is present, and say so plainly \
     when you do not know something.";

/// Load the persona block: file contents (or the built-in default) behind a
/// current-time header, trimmed to the token budget. Returns the block and
/// its estimated token count.
pub fn load(config: &AppConfig, estimator: &BudgetEstimator) -> (String, usize) {
    let path = config.persona_path();
    let body = read_persona(&path);

    let header = format!(
        "Current time: {}",
        Local::now().format("%A, %B %d, %Y at %H:%M")
    );
    let mut persona = format!("{header}\n\n{body}");

    let mut tokens = estimator.estimate(&persona);
    if tokens > PERSONA_TOKEN_BUDGET {
        persona = trim_to_budget(&persona, estimator);
        tokens = estimator.estimate(&persona);
        info!(tokens, "Persona trimmed to fit the overhead budget");
    }

    (persona, tokens)
}

fn read_persona(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) if !content.trim().is_empty() => {
            debug!(path = %path.display(), "Persona file loaded");
            content.trim().to_string()
        }
        _ => {
            debug!(path = %path.display(), "No persona file, using default");
            DEFAULT_PERSONA.to_string()
        }
    }
}

/// Drop trailing paragraphs until the block fits the budget. The time
/// header and the first paragraph are always kept.
fn trim_to_budget(persona: &str, estimator: &BudgetEstimator) -> String {
    let mut paragraphs: Vec<&str> = persona.split("\n\n").collect();

    while paragraphs.len() > 2 {
        let candidate = format!("{}\n\n{TRIM_MARKER}", paragraphs.join("\n\n"));
        if estimator.estimate(&candidate) <= PERSONA_TOKEN_BUDGET {
            return candidate;
        }
        paragraphs.pop();
    }

    format!("{}\n\n{TRIM_MARKER}", paragraphs.join("\n\n"))
}
