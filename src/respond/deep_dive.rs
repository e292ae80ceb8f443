//! Problem-structuring strategy.

use std::sync::Arc;

use crate::llm::{LlmRegistry, LlmTier};

use super::{StrategyReply, StrategyRequest, generate_or_fallback};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneの課題解決アシスタントです。
ユーザーの課題や問題を深掘りし、構造的に整理・分析することが役割です。

手順:
1. 問題の構造化: 何が本質的な課題なのかを見極める
2. 要因分析: 考えられる原因や要因を洗い出す
3. 選択肢の提示: 複数の解決アプローチを提示する
4. 次のアクション: 具体的な次の一歩を提案する

トーン:
- 論理的で整理された応答
- 箇条書きを活用して視認性を高める
- 「答え」を押し付けるのではなく、思考を促す質問も交える
- 日本語で応答する
"#;

/// Asks a clarifying question rather than pretending to have analyzed.
const FALLBACK_REPLY: &str = "課題を整理してみましょう。もう少し詳しく教えていただけますか？";

const TEMPERATURE: f32 = 0.4;

/// Structures a problem and proposes approaches on the balanced tier.
pub struct DeepDiveStrategy {
    llm: Arc<LlmRegistry>,
}

impl DeepDiveStrategy {
    pub fn new(llm: Arc<LlmRegistry>) -> Self {
        Self { llm }
    }

    pub async fn respond(&self, request: &StrategyRequest) -> StrategyReply {
        generate_or_fallback(
            &self.llm,
            LlmTier::Balanced,
            TEMPERATURE,
            SYSTEM_PROMPT,
            FALLBACK_REPLY,
            request,
        )
        .await
    }
}
