//! Deep-research strategy, reachable only through an explicit follow-up.

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{ChatMessage, GenerationRequest, LlmRegistry, LlmTier, TextGenerator};

use super::{FollowUpRequest, StrategyReply};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneの Deep Research アシスタントです。
ユーザーのクエリに対して、徹底的かつ包括的な調査レポートを作成してください。

### 調査方針:
1. **多角的な視点**: 複数の観点からトピックを分析する
2. **構造化された回答**: 見出し・箇条書きを使って情報を整理する
3. **エビデンスベース**: 主張には根拠や出典の方向性を示す
4. **実用性重視**: ユーザーが次のアクションを取れるような具体的な情報を提供する

### 出力フォーマット:
- 概要（1-2文のサマリー）
- 主要な発見・知見（箇条書き）
- 詳細分析（各ポイントの掘り下げ）
- 次のステップの提案

### 注意事項:
- 日本語で応答する
- 確証のない情報は「〜の可能性があります」等と明記する
- 専門用語には簡潔な説明を付ける
"#;

const FALLBACK_REPLY: &str =
    "申し訳ありません。Deep Research サービスが現在利用できません。\n通常の回答をご参照ください。";

/// Prefix that distinguishes a research reply from a primary-tier reply.
const RESULT_MARKER: &str = "🔬 **Deep Research 結果**";

/// Lowest temperature of any strategy; research synthesis favors determinism.
const TEMPERATURE: f32 = 0.3;

/// Produces a research report on the deep tier.
pub struct DeepResearchStrategy {
    llm: Arc<LlmRegistry>,
}

impl DeepResearchStrategy {
    pub fn new(llm: Arc<LlmRegistry>) -> Self {
        Self { llm }
    }

    pub async fn respond(&self, follow_up: &FollowUpRequest) -> StrategyReply {
        let generator = match self.llm.resolve(LlmTier::Deep) {
            Ok(generator) => generator,
            Err(unavailable) => {
                tracing::debug!(%unavailable, "deep research falling back to canned reply");
                return StrategyReply {
                    response: FALLBACK_REPLY.to_string(),
                };
            }
        };

        match generate(generator.as_ref(), follow_up).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "deep research generation failed");
                StrategyReply {
                    response: FALLBACK_REPLY.to_string(),
                }
            }
        }
    }
}

async fn generate(
    generator: &dyn TextGenerator,
    follow_up: &FollowUpRequest,
) -> Result<StrategyReply, LlmError> {
    generator.initialize().await?;

    let query = research_query(follow_up);
    tracing::info!(query_preview = %preview(&query), "deep research request");

    let response = generator
        .generate_text(
            GenerationRequest::new(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(query),
            ])
            .with_temperature(TEMPERATURE),
        )
        .await?;

    tracing::info!(response_preview = %preview(&response.content), "deep research completed");

    Ok(StrategyReply {
        response: format!("{RESULT_MARKER}\n\n{}", response.content),
    })
}

/// Reframe the query around the prior answer when one is available.
fn research_query(follow_up: &FollowUpRequest) -> String {
    match &follow_up.prior_response {
        Some(prior) => format!(
            "元の質問: {}\n\n初回の回答（これを深掘りしてください）:\n{}",
            follow_up.original_query, prior
        ),
        None => follow_up.original_query.clone(),
    }
}

fn preview(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_includes_prior_response_when_present() {
        let query = research_query(&FollowUpRequest {
            original_query: "睡眠の質を上げるには".to_string(),
            prior_response: Some("規則正しい生活が有効です".to_string()),
        });
        assert!(query.contains("元の質問: 睡眠の質を上げるには"));
        assert!(query.contains("規則正しい生活が有効です"));
    }

    #[test]
    fn query_is_unmodified_without_prior_response() {
        let query = research_query(&FollowUpRequest {
            original_query: "睡眠の質を上げるには".to_string(),
            prior_response: None,
        });
        assert_eq!(query, "睡眠の質を上げるには");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let text = "あ".repeat(300);
        assert_eq!(preview(&text).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
