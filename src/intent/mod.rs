//! Intent categories and classification results.

mod classifier;

pub use classifier::IntentClassifier;

use serde::{Deserialize, Serialize};

/// The classified purpose of a user's utterance.
///
/// `State` is a lightweight self-report category assigned by the ingestion
/// pipeline; no classifier path ever produces it. It participates in
/// profiling signals but bypasses the generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Chat,
    Empathy,
    Knowledge,
    DeepDive,
    Brainstorm,
    State,
}

impl Intent {
    /// Intent name as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Chat => "chat",
            Intent::Empathy => "empathy",
            Intent::Knowledge => "knowledge",
            Intent::DeepDive => "deep_dive",
            Intent::Brainstorm => "brainstorm",
            Intent::State => "state",
        }
    }

    /// Parse a wire string. Returns `None` for unknown values; callers decide
    /// the default.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(Intent::Chat),
            "empathy" => Some(Intent::Empathy),
            "knowledge" => Some(Intent::Knowledge),
            "deep_dive" => Some(Intent::DeepDive),
            "brainstorm" => Some(Intent::Brainstorm),
            "state" => Some(Intent::State),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one classification cycle. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_round_trip() {
        for intent in [
            Intent::Chat,
            Intent::Empathy,
            Intent::Knowledge,
            Intent::DeepDive,
            Intent::Brainstorm,
            Intent::State,
        ] {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("banana"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Intent::DeepDive).unwrap(),
            "\"deep_dive\""
        );
        let parsed: Intent = serde_json::from_str("\"state\"").unwrap();
        assert_eq!(parsed, Intent::State);
    }
}
