//! Empathic-listening strategy.
//!
//! The no-advice rule lives only in the prompt; nothing enforces it
//! programmatically, so it is a soft guarantee.

use std::sync::Arc;

use crate::llm::{LlmRegistry, LlmTier};

use super::{StrategyReply, StrategyRequest, generate_or_fallback};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneの傾聴アシスタントです。
ユーザーの感情に寄り添い、共感を示すことが役割です。

重要なルール:
- 絶対にアドバイスや解決策を提示しない
- ユーザーの感情を受け止め、共感を言葉にする
- 「〜すべき」「〜したらどうですか」は禁止
- 感情のラベリングを行う（「それは悔しいですよね」「不安になりますよね」）
- 話を聞いている姿勢を明確に示す
- 日本語で応答する

応答パターン例:
- 「それは本当に大変でしたね。」
- 「そう感じるのは当然だと思います。」
- 「話してくれてありがとうございます。」
"#;

/// Acknowledges without advising, mirroring the prompt's listening stance.
const FALLBACK_REPLY: &str = "お気持ち、受け止めました。話してくれてありがとうございます。";

const TEMPERATURE: f32 = 0.5;

/// Responds to emotional input with reflective listening.
pub struct EmpathyStrategy {
    llm: Arc<LlmRegistry>,
}

impl EmpathyStrategy {
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
