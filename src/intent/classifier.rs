//! Intent classification for user input.
//!
//! Primary path asks the fast-tier model for a category as JSON; when the
//! model is unavailable or misbehaves, a deterministic keyword scorer takes
//! over. Classification never fails and never raises to the caller.

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{ChatMessage, LlmRegistry, LlmTier, TextGenerator};

use super::{ClassificationResult, Intent};

/// Confidence reported when no fallback keyword matches at all.
const NO_SIGNAL_CONFIDENCE: f32 = 0.3;

/// Ceiling for fallback confidence. Keyword scoring is bounded below the
/// model path's ceiling to reflect its lower reliability.
const FALLBACK_CONFIDENCE_CAP: f32 = 0.7;

/// Confidence assumed when the model omits or mangles the field.
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Classification temperature. Kept low to minimize variance.
const CLASSIFY_TEMPERATURE: f32 = 0.1;

const SYSTEM_PROMPT: &str = r#"あなたはユーザー入力の意図分類器です。
入力テキストを以下の5カテゴリのいずれかに分類してください。

カテゴリ:
- "chat": 雑談、挨拶、日常会話、特に目的のない会話
- "empathy": 感情的な表現、愚痴、不満、悩み、共感を求めている
- "knowledge": 知識や情報を求めている質問、「〜とは？」「〜の方法は？」
- "deep_dive": 具体的な課題や問題の解決を求めている、分析・整理したい
- "brainstorm": アイデア出し、仮説検証、壁打ち、創造的な発想を求めている

必ず以下のJSON形式で応答してください:
{
    "intent": "chat" | "empathy" | "knowledge" | "deep_dive" | "brainstorm",
    "confidence": 0.0〜1.0
}"#;

/// Keyword lists for the deterministic fallback, in category order.
/// Ties between categories keep the earliest entry.
const KEYWORD_MAP: &[(Intent, &[&str])] = &[
    (
        Intent::Empathy,
        &[
            "つらい",
            "しんどい",
            "疲れた",
            "嫌だ",
            "ひどい",
            "悲しい",
            "不安",
            "怖い",
            "寂しい",
            "イライラ",
            "ムカつく",
            "最悪",
            "聞いて",
            "吐き出し",
            "愚痴",
            "ため息",
        ],
    ),
    (
        Intent::Knowledge,
        &[
            "教えて",
            "知りたい",
            "とは",
            "って何",
            "ですか",
            "違いは",
            "方法は",
            "やり方",
            "調べ",
            "検索",
            "参考",
            "文献",
            "論文",
            "データ",
        ],
    ),
    (
        Intent::DeepDive,
        &[
            "どうすれば",
            "解決",
            "改善",
            "対策",
            "問題",
            "原因",
            "なぜ",
            "課題",
            "困って",
            "うまくいかない",
            "分析",
            "検討",
            "整理したい",
            "深掘り",
        ],
    ),
    (
        Intent::Brainstorm,
        &[
            "アイデア",
            "案",
            "ひらめき",
            "思いつき",
            "仮説",
            "壁打ち",
            "ブレスト",
            "発想",
            "もし",
            "可能性",
            "新しい",
            "試したい",
            "どうだろう",
            "妄想",
        ],
    ),
];

/// Maps raw input text to an intent category plus a confidence score.
pub struct IntentClassifier {
    llm: Arc<LlmRegistry>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<LlmRegistry>) -> Self {
        Self { llm }
    }

    /// Classify `input_text`. Degraded paths land on the keyword fallback;
    /// the caller always gets a valid result.
    pub async fn classify(&self, input_text: &str) -> ClassificationResult {
        let generator = match self.llm.resolve(LlmTier::Fast) {
            Ok(generator) => generator,
            Err(unavailable) => {
                tracing::debug!(%unavailable, "classifying with keyword fallback");
                return fallback_classify(input_text);
            }
        };

        match classify_with_model(generator.as_ref(), input_text).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "intent classification via model failed");
                fallback_classify(input_text)
            }
        }
    }
}

async fn classify_with_model(
    generator: &dyn TextGenerator,
    input_text: &str,
) -> Result<ClassificationResult, LlmError> {
    generator.initialize().await?;

    let value = generator
        .generate_json(
            vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(input_text),
            ],
            Some(CLASSIFY_TEMPERATURE),
        )
        .await?;

    Ok(parse_classification(&value))
}

/// Map a model JSON payload to a result. Unknown intents and missing or
/// non-numeric confidences degrade to defaults instead of erroring. `state`
/// is not a model category and degrades like any unknown value.
fn parse_classification(value: &serde_json::Value) -> ClassificationResult {
    let intent = value
        .get("intent")
        .and_then(|v| v.as_str())
        .and_then(Intent::parse)
        .filter(|intent| *intent != Intent::State)
        .unwrap_or(Intent::Chat);

    let confidence = value
        .get("confidence")
        .and_then(|v| v.as_f64())
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(DEFAULT_CONFIDENCE);

    ClassificationResult { intent, confidence }
}

/// Deterministic keyword fallback.
///
/// Scores each category by the number of its keywords present in the input.
/// The highest score wins, ties keep the earliest category, and confidence is
/// the winner's share of the total score.
fn fallback_classify(input_text: &str) -> ClassificationResult {
    let mut best_intent = Intent::Chat;
    let mut best_score = 0u32;
    let mut total = 0u32;

    for (intent, keywords) in KEYWORD_MAP {
        let score = keywords
            .iter()
            .filter(|keyword| input_text.contains(*keyword))
            .count() as u32;
        total += score;
        if score > best_score {
            best_score = score;
            best_intent = *intent;
        }
    }

    if best_score == 0 {
        return ClassificationResult {
            intent: Intent::Chat,
            confidence: NO_SIGNAL_CONFIDENCE,
        };
    }

    ClassificationResult {
        intent: best_intent,
        confidence: (best_score as f32 / total as f32).min(FALLBACK_CONFIDENCE_CAP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_single_category_hit() {
        let result = fallback_classify("転職のやり方を調べたい");
        assert_eq!(result.intent, Intent::Knowledge);
        assert!(result.confidence <= FALLBACK_CONFIDENCE_CAP);
        assert!(result.confidence > 0.0);
    }

    #[test]
    fn fallback_no_match_is_low_confidence_chat() {
        let result = fallback_classify("こんにちは");
        assert_eq!(result.intent, Intent::Chat);
        assert_eq!(result.confidence, NO_SIGNAL_CONFIDENCE);
    }

    #[test]
    fn fallback_confidence_capped_on_exclusive_match() {
        // Every hit lands in one category, so the raw share would be 1.0.
        let result = fallback_classify("教えて。とは、方法は、やり方、知りたい");
        assert_eq!(result.intent, Intent::Knowledge);
        assert_eq!(result.confidence, FALLBACK_CONFIDENCE_CAP);
    }

    #[test]
    fn fallback_tie_keeps_earliest_category() {
        // One empathy keyword and one brainstorm keyword.
        let result = fallback_classify("愚痴と新しい話");
        assert_eq!(result.intent, Intent::Empathy);
    }

    #[test]
    fn parse_unknown_intent_defaults_to_chat() {
        let result = parse_classification(&json!({"intent": "banana", "confidence": 0.9}));
        assert_eq!(result.intent, Intent::Chat);
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn parse_state_is_not_a_model_category() {
        let result = parse_classification(&json!({"intent": "state", "confidence": 0.9}));
        assert_eq!(result.intent, Intent::Chat);
    }

    #[test]
    fn parse_missing_fields_use_defaults() {
        let result = parse_classification(&json!({}));
        assert_eq!(result.intent, Intent::Chat);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn parse_non_numeric_confidence_uses_default() {
        let result = parse_classification(&json!({"intent": "empathy", "confidence": "high"}));
        assert_eq!(result.intent, Intent::Empathy);
        assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn parse_clamps_out_of_range_confidence() {
        let result = parse_classification(&json!({"intent": "chat", "confidence": 3.5}));
        assert_eq!(result.confidence, 1.0);
        let result = parse_classification(&json!({"intent": "chat", "confidence": -2.0}));
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn classify_without_client_uses_fallback() {
        let classifier = IntentClassifier::new(Arc::new(LlmRegistry::new(Default::default())));
        let result = classifier.classify("教えて、とは何ですか").await;
        assert_eq!(result.intent, Intent::Knowledge);
    }
}
