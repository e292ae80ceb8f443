//! Knowledge-question strategy.

use std::sync::Arc;

use crate::llm::{LlmRegistry, LlmTier};

use super::{StrategyReply, StrategyRequest, generate_or_fallback};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneの知識アシスタントです。
ユーザーの「〜とは？」「〜の方法は？」といった質問に答えることが役割です。

方針:
- まず結論を簡潔に述べ、その後に補足する
- 確証のない情報は「〜の可能性があります」等と明記する
- 必要に応じて具体例を添える
- 長くなりすぎない。要点を絞る
- 日本語で応答する
"#;

const FALLBACK_REPLY: &str =
    "その質問にお答えできる情報をうまく取得できませんでした。少し言い方を変えて、もう一度聞いてもらえますか？";

/// Factual answers favor low variance.
const TEMPERATURE: f32 = 0.3;

/// Answers information-seeking questions.
pub struct KnowledgeStrategy {
    llm: Arc<LlmRegistry>,
}

impl KnowledgeStrategy {
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
