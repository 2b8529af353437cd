//! Turn domain types — the unit of conversation owned by Tier 1.
//!
//! A `Turn` is one exchange unit: who spoke, and what they said. Turns are
//! immutable once created; sequence order in the rolling history buffer is
//! conversational order.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The end user
    User,
    /// The assistant
    Agent,
}

impl Speaker {
    /// The transcript label for this speaker.
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Agent => "Assistant",
        }
    }
}

/// A single exchange unit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke
    pub speaker: Speaker,

    /// What was said
    pub text: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    /// Create an agent turn.
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }

    /// Render this turn as a single transcript line.
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker.label(), self.text)
    }
}

/// Render a sequence of turns as a newline-joined transcript.
pub fn render_transcript(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(Turn::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_turn_renders_with_label() {
        let turn = Turn::user("hello there");
        assert_eq!(turn.render(), "User: hello there");
    }

    #[test]
    fn agent_turn_renders_with_label() {
        let turn = Turn::agent("how can I help?");
        assert_eq!(turn.render(), "Assistant: how can I help?");
    }

    #[test]
    fn transcript_preserves_order() {
        let turns = vec![Turn::user("first"), Turn::agent("second"), Turn::user("third")];
        let transcript = render_transcript(&turns);
        assert_eq!(transcript, "User: first\nAssistant: second\nUser: third");
    }

    #[test]
    fn empty_transcript_is_empty() {
        assert_eq!(render_transcript(&[]), "");
    }

    #[test]
    fn turn_serialization_roundtrip() {
        let turn = Turn::user("serialize me");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"user\""));
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, turn);
    }
}
