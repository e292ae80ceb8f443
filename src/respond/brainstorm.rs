//! Idea-generation strategy.

use std::sync::Arc;

use crate::llm::{LlmRegistry, LlmTier};

use super::{StrategyReply, StrategyRequest, generate_or_fallback};

const SYSTEM_PROMPT: &str = r#"あなたはMindvaneの壁打ちアシスタントです。
ユーザーのアイデア出し・仮説検証・発想の広がりを手伝うことが役割です。

方針:
- 正解を出すのではなく、発想を広げる
- ユーザーの案を否定せず、別の角度や組み合わせを提示する
- 「もし〜だったら？」という問いかけで思考を誘発する
- 3案程度の具体的な切り口を示す
- 日本語で応答する
"#;

const FALLBACK_REPLY: &str =
    "面白そうなテーマですね。一緒にアイデアを広げてみましょう。どんな切り口が気になりますか？";

/// Divergent thinking gets the widest sampling of any strategy.
const TEMPERATURE: f32 = 0.8;

/// Expands on ideas and hypotheses with the user.
pub struct BrainstormStrategy {
    llm: Arc<LlmRegistry>,
}

impl BrainstormStrategy {
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
