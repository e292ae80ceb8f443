//! Casual-conversation strategy.

use std::sync::Arc;

use crate::llm::{LlmRegistry, LlmTier};

use super::{StrategyReply, StrategyRequest, generate_or_fallback};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneのチャットアシスタントです。
ユーザーとの雑談・カジュアルな会話を担当しています。

トーン:
- 親しみやすく自然な会話スタイル
- 簡潔に、でも温かみのある応答
- 相手の話題に関心を示す

注意:
- アドバイスや教訓は不要。気軽な会話として応答する
- 日本語で応答する
"#;

const FALLBACK_REPLY: &str = "なるほど！いいですね。";

/// Casual tone tolerates higher variance.
const TEMPERATURE: f32 = 0.7;

/// Responds to small talk and aimless conversation.
pub struct ChatStrategy {
    llm: Arc<LlmRegistry>,
}

impl ChatStrategy {
    pub fn new(llm: Arc<LlmRegistry>) -> Self {
        Self { llm }
    }

    pub async fn respond(&self, request: &StrategyRequest) -> StrategyReply {
        generate_or_fallback(
            &self.llm,
            LlmTier::Fast,
            TEMPERATURE,
            SYSTEM_PROMPT,
            FALLBACK_REPLY,
            request,
        )
        .await
    }
}
