//! Natural-language reduction of a profile for prompt injection.

use super::{EmotionTrend, Profile};

/// Dominant emotions that mark a topic as stress-associated.
const STRESS_EMOTIONS: &[&str] = &["frustrated", "anxious", "angry"];
/// Dominant emotions that mark a topic as comfort-associated.
const COMFORT_EMOTIONS: &[&str] = &["achieved", "excited", "relieved"];

/// Minimum entries before a summary carries any signal.
const MIN_LOG_COUNT: usize = 3;

/// Reduce a profile to the ordered line list injected into strategy prompts.
///
/// Pure function, no I/O. Returns `None` when the profile is too thin to say
/// anything useful.
pub fn generate_context_summary(profile: &Profile) -> Option<String> {
    if profile.log_count < MIN_LOG_COUNT {
        return None;
    }

    let mut lines: Vec<String> = Vec::new();

    let top = &profile.emotion_trends.top_emotions;
    if !top.is_empty() {
        let described = top
            .iter()
            .take(3)
            .map(|e| format!("{}({}回)", e.emotion, e.count))
            .collect::<Vec<_>>()
            .join("、");
        lines.push(format!(
            "直近{}日間の感情傾向: {}",
            profile.period_days, described
        ));
    }

    match profile.emotion_trends.recent_trend {
        EmotionTrend::Stable => {}
        EmotionTrend::MoreNegative => {
            lines.push("変化: ネガティブな感情が増加傾向".to_string());
        }
        EmotionTrend::MorePositive => {
            lines.push("変化: ポジティブな感情が増加傾向".to_string());
        }
        EmotionTrend::FatigueIncreasing => {
            lines.push("変化: 疲労・ストレスの訴えが増加傾向".to_string());
        }
    }

    let stress_topics = topics_with_dominant(profile, STRESS_EMOTIONS);
    if !stress_topics.is_empty() {
        lines.push(format!(
            "ストレスと関連が深いトピック: {}",
            stress_topics.join(", ")
        ));
    }

    let comfort_topics = topics_with_dominant(profile, COMFORT_EMOTIONS);
    if !comfort_topics.is_empty() {
        lines.push(format!(
            "ポジティブな感情と結びつくトピック: {}",
            comfort_topics.join(", ")
        ));
    }

    for signal in &profile.signals {
        lines.push(format!("⚠ {}", signal.description));
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Topics whose dominant emotion is in `set`, at most three.
fn topics_with_dominant<'a>(profile: &'a Profile, set: &[&str]) -> Vec<&'a str> {
    profile
        .topic_emotion_map
        .iter()
        .filter(|(_, info)| set.contains(&info.dominant_emotion.as_str()))
        .map(|(topic, _)| topic.as_str())
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{EmotionCount, Severity, Signal, SignalType, TopicEmotion};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn profile_with_logs(log_count: usize) -> Profile {
        let mut profile = Profile::empty(Utc::now());
        profile.log_count = log_count;
        profile
    }

    #[test]
    fn thin_profile_has_no_summary() {
        assert_eq!(generate_context_summary(&profile_with_logs(0)), None);
        assert_eq!(generate_context_summary(&profile_with_logs(2)), None);
    }

    #[test]
    fn empty_aggregates_have_no_summary_even_with_enough_logs() {
        assert_eq!(generate_context_summary(&profile_with_logs(5)), None);
    }

    #[test]
    fn summary_lists_emotions_trend_topics_and_signals_in_order() {
        let mut profile = profile_with_logs(12);
        profile.emotion_trends.top_emotions = vec![
            EmotionCount {
                emotion: "anxious".to_string(),
                count: 6,
            },
            EmotionCount {
                emotion: "excited".to_string(),
                count: 3,
            },
        ];
        profile.emotion_trends.recent_trend = EmotionTrend::FatigueIncreasing;

        let mut distribution = BTreeMap::new();
        distribution.insert("anxious".to_string(), 3);
        profile.topic_emotion_map.insert(
            "仕事".to_string(),
            TopicEmotion {
                dominant_emotion: "anxious".to_string(),
                count: 3,
                distribution: distribution.clone(),
            },
        );
        let mut comfort = BTreeMap::new();
        comfort.insert("excited".to_string(), 2);
        profile.topic_emotion_map.insert(
            "読書".to_string(),
            TopicEmotion {
                dominant_emotion: "excited".to_string(),
                count: 2,
                distribution: comfort,
            },
        );

        profile.signals.push(Signal {
            signal_type: SignalType::StressIncreasing,
            severity: Severity::Warning,
            description: "直近1週間でストレス・焦りの訴えが増加している".to_string(),
        });

        let summary = generate_context_summary(&profile).expect("summary");
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("直近14日間の感情傾向"));
        assert!(lines[0].contains("anxious(6回)"));
        assert!(lines[1].contains("疲労・ストレスの訴えが増加傾向"));
        assert!(lines[2].contains("仕事"));
        assert!(lines[3].contains("読書"));
        assert!(lines[4].starts_with("⚠ "));
    }

    #[test]
    fn stable_trend_produces_no_trend_line() {
        let mut profile = profile_with_logs(5);
        profile.emotion_trends.top_emotions = vec![EmotionCount {
            emotion: "calm".to_string(),
            count: 4,
        }];
        profile.emotion_trends.recent_trend = EmotionTrend::Stable;

        let summary = generate_context_summary(&profile).expect("summary");
        assert!(!summary.contains("変化:"));
    }
}
