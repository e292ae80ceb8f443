//! Windowed aggregation of log entries into a behavioral profile.
//!
//! Aggregation runs off the hot response path, triggered by an external
//! scheduler. Each run reads a bounded window of analyzed entries and
//! replaces the user's profile document wholesale; concurrent runs for the
//! same user are last-writer-wins, which is acceptable because profiles are
//! idempotently rebuildable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::intent::Intent;
use crate::store::{LogEntry, Store};

use super::{
    EmotionCount, EmotionTrend, EmotionTrends, FrequencyChange, PostingPattern, Profile, Severity,
    Signal, SignalType, TopicEmotion,
};

/// Full aggregation window in days.
pub const RECENT_DAYS: i64 = 14;
/// Short sub-window compared against the remainder to detect change.
pub const TREND_DAYS: i64 = 7;

/// Hard cap on entries considered per run.
const FETCH_LIMIT: i64 = 200;

/// Emotions treated as negative when comparing windows.
const NEGATIVE_EMOTIONS: &[&str] = &["frustrated", "angry", "anxious", "confused"];
/// Subset of the vocabulary indicating fatigue or stress.
const FATIGUE_EMOTIONS: &[&str] = &["frustrated", "anxious"];

/// Content keywords whose repetition across entries raises a fatigue signal.
const FATIGUE_KEYWORDS: &[&str] = &["疲れ", "だるい", "眠い", "しんどい", "つらい", "きつい"];

/// Newest entries scanned for the state-dominance signal.
const STATE_WINDOW: usize = 20;
/// State entries within that window that trigger the signal.
const STATE_DOMINANT_MIN: usize = 10;
/// Entries containing a fatigue keyword that trigger the repetition signal.
const FATIGUE_REPETITION_MIN: usize = 5;

/// Minimum emotion occurrences before a topic is statistically meaningful.
const TOPIC_MIN_OCCURRENCES: usize = 2;

/// Builds and persists per-user behavioral profiles.
pub struct ProfileAggregator {
    store: Arc<Store>,
}

impl ProfileAggregator {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Build a profile from the user's recent analyzed entries. Pure read; a
    /// user with no qualifying entries gets the canonical empty profile.
    pub async fn build_profile(&self, user_id: Uuid) -> Result<Profile, DatabaseError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(RECENT_DAYS);

        let entries = self
            .store
            .recent_analyzed_entries(user_id, cutoff, FETCH_LIMIT)
            .await?;

        Ok(assemble_profile(&entries, now))
    }

    /// Build a profile and overwrite the user's stored document.
    ///
    /// An empty profile is returned without writing, and a missing user row
    /// is tolerated: the profile is still returned, just not saved.
    pub async fn build_and_save(&self, user_id: Uuid) -> Result<Profile, DatabaseError> {
        let profile = self.build_profile(user_id).await?;

        if profile.is_empty() {
            return Ok(profile);
        }

        let saved = self.store.save_user_profile(user_id, &profile).await?;
        if saved {
            tracing::info!(
                %user_id,
                log_count = profile.log_count,
                signals = profile.signals.len(),
                "profile updated"
            );
        } else {
            tracing::warn!(%user_id, "user row not found, profile not persisted");
        }

        Ok(profile)
    }
}

/// Pure aggregation core. `entries` must be ordered newest-first (the store
/// guarantees this); `now` is injected so the window math is deterministic.
fn assemble_profile(entries: &[LogEntry], now: DateTime<Utc>) -> Profile {
    if entries.is_empty() {
        return Profile::empty(now);
    }

    let trend_cutoff = now - Duration::days(TREND_DAYS);

    let emotion_trends = aggregate_emotions(entries, trend_cutoff);
    let topic_emotion_map = aggregate_topic_emotions(entries);
    let posting_pattern = aggregate_posting_pattern(entries, trend_cutoff);
    let signals = detect_signals(entries, &emotion_trends, &posting_pattern);

    Profile {
        updated_at: now,
        log_count: entries.len(),
        period_days: RECENT_DAYS as u32,
        emotion_trends,
        topic_emotion_map,
        posting_pattern,
        signals,
    }
}

/// Count emotion occurrences and compare the trend sub-window against the
/// remainder of the aggregation window.
fn aggregate_emotions(entries: &[LogEntry], trend_cutoff: DateTime<Utc>) -> EmotionTrends {
    let mut counter: HashMap<&str, usize> = HashMap::new();
    let mut recent: HashMap<&str, usize> = HashMap::new();
    let mut older: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        for emotion in &entry.emotions {
            *counter.entry(emotion.as_str()).or_default() += 1;
            if entry.created_at >= trend_cutoff {
                *recent.entry(emotion.as_str()).or_default() += 1;
            } else {
                *older.entry(emotion.as_str()).or_default() += 1;
            }
        }
    }

    let mut ranked: Vec<(&str, usize)> = counter.iter().map(|(e, c)| (*e, *c)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let top_emotions = ranked
        .iter()
        .take(5)
        .map(|(emotion, count)| EmotionCount {
            emotion: emotion.to_string(),
            count: *count,
        })
        .collect();

    EmotionTrends {
        top_emotions,
        total_entries: counter.values().sum(),
        recent_trend: detect_emotion_trend(&recent, &older),
    }
}

/// Share of a bucket's occurrences that fall in `set`. An empty bucket counts
/// as one occurrence to keep the ratio defined.
fn set_ratio(bucket: &HashMap<&str, usize>, set: &[&str]) -> f64 {
    let total = bucket.values().sum::<usize>().max(1) as f64;
    let in_set: usize = set.iter().filter_map(|e| bucket.get(e)).sum();
    in_set as f64 / total
}

fn detect_emotion_trend(recent: &HashMap<&str, usize>, older: &HashMap<&str, usize>) -> EmotionTrend {
    let recent_fatigue = set_ratio(recent, FATIGUE_EMOTIONS);
    let older_fatigue = set_ratio(older, FATIGUE_EMOTIONS);
    let recent_negative = set_ratio(recent, NEGATIVE_EMOTIONS);
    let older_negative = set_ratio(older, NEGATIVE_EMOTIONS);

    if recent_fatigue > older_fatigue + 0.2 {
        EmotionTrend::FatigueIncreasing
    } else if recent_negative > older_negative + 0.15 {
        EmotionTrend::MoreNegative
    } else if recent_negative < older_negative - 0.15 {
        EmotionTrend::MorePositive
    } else {
        EmotionTrend::Stable
    }
}

/// Accumulate per-topic emotion distributions from within-entry
/// co-occurrences. Topics below the occurrence floor are dropped.
fn aggregate_topic_emotions(entries: &[LogEntry]) -> BTreeMap<String, TopicEmotion> {
    let mut per_topic: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();

    for entry in entries {
        for topic in &entry.topics {
            for emotion in &entry.emotions {
                *per_topic
                    .entry(topic.as_str())
                    .or_default()
                    .entry(emotion.as_str())
                    .or_default() += 1;
            }
        }
    }

    per_topic
        .into_iter()
        .filter_map(|(topic, distribution)| {
            let count: usize = distribution.values().sum();
            if count < TOPIC_MIN_OCCURRENCES {
                return None;
            }

            let mut dominant = ("", 0usize);
            for (emotion, occurrences) in &distribution {
                if *occurrences > dominant.1 {
                    dominant = (emotion, *occurrences);
                }
            }

            Some((
                topic.to_string(),
                TopicEmotion {
                    dominant_emotion: dominant.0.to_string(),
                    count,
                    distribution: distribution
                        .into_iter()
                        .map(|(e, c)| (e.to_string(), c))
                        .collect(),
                },
            ))
        })
        .collect()
}

fn aggregate_posting_pattern(entries: &[LogEntry], trend_cutoff: DateTime<Utc>) -> PostingPattern {
    let mut daily: HashMap<NaiveDate, usize> = HashMap::new();
    let mut hourly: HashMap<u32, usize> = HashMap::new();

    for entry in entries {
        *daily.entry(entry.created_at.date_naive()).or_default() += 1;
        *hourly.entry(entry.created_at.hour()).or_default() += 1;
    }

    let active_days = daily.len().max(1);
    let avg_per_day = round_one_decimal(entries.len() as f64 / active_days as f64);

    let mut ranked_hours: Vec<(u32, usize)> = hourly.into_iter().collect();
    ranked_hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let peak_hours = ranked_hours.iter().take(3).map(|(hour, _)| *hour).collect();

    let recent_count = entries
        .iter()
        .filter(|e| e.created_at >= trend_cutoff)
        .count();
    let older_count = entries.len() - recent_count;

    let recent_avg = recent_count as f64 / TREND_DAYS as f64;
    let older_avg = older_count as f64 / (RECENT_DAYS - TREND_DAYS).max(1) as f64;

    // olderAvg == 0 means no baseline; never label a change off it.
    let frequency_change = if older_avg > 0.0 && recent_avg < older_avg * 0.5 {
        FrequencyChange::Decreasing
    } else if older_avg > 0.0 && recent_avg > older_avg * 1.5 {
        FrequencyChange::Increasing
    } else {
        FrequencyChange::Stable
    };

    PostingPattern {
        avg_per_day,
        peak_hours,
        frequency_change,
        total_logs: entries.len(),
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Evaluate every signal independently; all applicable signals are included.
fn detect_signals(
    entries: &[LogEntry],
    emotion_trends: &EmotionTrends,
    posting_pattern: &PostingPattern,
) -> Vec<Signal> {
    let mut signals = Vec::new();

    let fatigue_count = entries
        .iter()
        .filter(|e| FATIGUE_KEYWORDS.iter().any(|kw| e.content.contains(kw)))
        .count();
    if fatigue_count >= FATIGUE_REPETITION_MIN {
        signals.push(Signal {
            signal_type: SignalType::FatigueRepetition,
            severity: Severity::Warning,
            description: format!(
                "疲労に関する投稿が{fatigue_count}回（{RECENT_DAYS}日間）。慢性的な疲労の可能性"
            ),
        });
    }

    match emotion_trends.recent_trend {
        EmotionTrend::FatigueIncreasing => signals.push(Signal {
            signal_type: SignalType::StressIncreasing,
            severity: Severity::Warning,
            description: "直近1週間でストレス・焦りの訴えが増加している".to_string(),
        }),
        EmotionTrend::MoreNegative => signals.push(Signal {
            signal_type: SignalType::NegativityIncreasing,
            severity: Severity::Info,
            description: "直近1週間でネガティブな感情が増加傾向".to_string(),
        }),
        _ => {}
    }

    if posting_pattern.frequency_change == FrequencyChange::Decreasing {
        signals.push(Signal {
            signal_type: SignalType::PostingDecrease,
            severity: Severity::Info,
            description: "投稿頻度が減少傾向。無気力や回避の兆候の可能性".to_string(),
        });
    }

    let state_count = entries
        .iter()
        .take(STATE_WINDOW)
        .filter(|e| e.intent == Intent::State)
        .count();
    if state_count >= STATE_DOMINANT_MIN {
        signals.push(Signal {
            signal_type: SignalType::StateDominant,
            severity: Severity::Info,
            description: "状態記録が多い。深い思考よりも日々の状態共有がメイン".to_string(),
        });
    }

    signals
}
