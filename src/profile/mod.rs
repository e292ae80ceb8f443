//! Longitudinal behavioral profile types.
//!
//! The profile document is persisted as JSONB, read back by later aggregation
//! runs and by response strategies; field names are part of the storage
//! contract and must stay stable.

mod aggregator;
mod summary;

pub use aggregator::{ProfileAggregator, RECENT_DAYS, TREND_DAYS};
pub use summary::generate_context_summary;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's aggregated profile. Wholly replaced on each aggregation run,
/// never patched incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub updated_at: DateTime<Utc>,
    pub log_count: usize,
    /// Aggregation window size in days.
    pub period_days: u32,
    #[serde(default)]
    pub emotion_trends: EmotionTrends,
    #[serde(default)]
    pub topic_emotion_map: BTreeMap<String, TopicEmotion>,
    #[serde(default)]
    pub posting_pattern: PostingPattern,
    #[serde(default)]
    pub signals: Vec<Signal>,
}

impl Profile {
    /// Canonical profile for a user with no qualifying entries: all
    /// collections empty, never null.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            log_count: 0,
            period_days: RECENT_DAYS as u32,
            emotion_trends: EmotionTrends::default(),
            topic_emotion_map: BTreeMap::new(),
            posting_pattern: PostingPattern::default(),
            signals: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.log_count == 0
    }
}

/// Emotion occurrence counts and their change across the trend window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionTrends {
    /// Top emotions by frequency, at most five.
    pub top_emotions: Vec<EmotionCount>,
    /// Total emotion occurrences across the window.
    pub total_entries: usize,
    pub recent_trend: EmotionTrend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionCount {
    pub emotion: String,
    pub count: usize,
}

/// Direction of emotional change between the recent and older halves of the
/// aggregation window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTrend {
    #[default]
    Stable,
    MoreNegative,
    MorePositive,
    FatigueIncreasing,
}

/// Emotion distribution attached to one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicEmotion {
    pub dominant_emotion: String,
    /// Total emotion occurrences for the topic.
    pub count: usize,
    pub distribution: BTreeMap<String, usize>,
}

/// Posting frequency and timing statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingPattern {
    /// Entries per active day, one decimal.
    pub avg_per_day: f64,
    /// Most active hours of day, at most three.
    pub peak_hours: Vec<u32>,
    pub frequency_change: FrequencyChange,
    pub total_logs: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyChange {
    #[default]
    Stable,
    Decreasing,
    Increasing,
}

/// A derived behavioral observation surfaced from aggregated history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    FatigueRepetition,
    StressIncreasing,
    NegativityIncreasing,
    PostingDecrease,
    StateDominant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_is_well_defined() {
        let profile = Profile::empty(Utc::now());
        assert!(profile.is_empty());
        assert_eq!(profile.log_count, 0);
        assert_eq!(profile.period_days, 14);
        assert!(profile.emotion_trends.top_emotions.is_empty());
        assert!(profile.topic_emotion_map.is_empty());
        assert!(profile.signals.is_empty());
        assert_eq!(profile.posting_pattern.frequency_change, FrequencyChange::Stable);
    }

    #[test]
    fn document_field_names_are_stable() {
        let mut profile = Profile::empty(Utc::now());
        profile.log_count = 4;
        profile.emotion_trends.recent_trend = EmotionTrend::FatigueIncreasing;
        profile.signals.push(Signal {
            signal_type: SignalType::FatigueRepetition,
            severity: Severity::Warning,
            description: "desc".to_string(),
        });

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["log_count"], 4);
        assert_eq!(value["period_days"], 14);
        assert_eq!(
            value["emotion_trends"]["recent_trend"],
            "fatigue_increasing"
        );
        assert_eq!(value["signals"][0]["type"], "fatigue_repetition");
        assert_eq!(value["signals"][0]["severity"], "warning");

        let restored: Profile = serde_json::from_value(value).unwrap();
        assert_eq!(restored.log_count, 4);
        assert_eq!(restored.signals.len(), 1);
    }
}
